use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::handlers::utils::parse_id;
use crate::middleware::{bearer_token, ApiResponse, ApiResult};
use crate::services::{LoginInput, RegisterInput, SessionGrant};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub user: UserProfile,
    /// Signed reference to the cookie's session, for clients that send
    /// bearer tokens
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthCheck {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// POST /api/users/register - create an account and start a session
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<SessionBody> {
    let Json(input) = payload?;
    let grant = state.auth.register(input, &session).await?;
    Ok(ApiResponse::created(grant.into()))
}

/// POST /api/users/login - start a session
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<SessionBody> {
    let Json(input) = payload?;
    let grant = state.auth.login(input, &session).await?;
    Ok(ApiResponse::success(grant.into()))
}

/// POST /api/users/logout - end the current session, if any
pub async fn logout(State(state): State<AppState>, session: Session, headers: HeaderMap) -> ApiResult<Value> {
    let bearer = bearer_token(&headers);
    state.auth.logout(&session, bearer.as_deref()).await?;
    Ok(ApiResponse::message("Logged out successfully"))
}

/// GET /api/users/auth/check - report whether the caller has a live session
pub async fn auth_check(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> ApiResult<AuthCheck> {
    let bearer = bearer_token(&headers);
    let user = state.auth.current_user(&session, bearer.as_deref()).await;
    Ok(ApiResponse::success(AuthCheck {
        authenticated: user.is_some(),
        user,
    }))
}

/// GET /api/users/profile/:id - public profile
pub async fn profile_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserProfile> {
    let user_id = parse_id(&id, "User")?;
    let profile = state.users.get_profile(user_id).await?;
    Ok(ApiResponse::success(profile))
}

impl From<SessionGrant> for SessionBody {
    fn from(grant: SessionGrant) -> Self {
        Self {
            user: grant.user,
            token: grant.token,
            expires_at: grant.expires_at,
        }
    }
}
