use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{ServiceError, UpdateProfileInput};

/// PUT /api/users/profile/:id - update own name, avatar or bio
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileInput>, JsonRejection>,
) -> ApiResult<UserProfile> {
    // An id that does not parse is never the caller's own
    let user_id = Uuid::parse_str(&id).map_err(|_| ServiceError::Unauthorized)?;
    let Json(input) = payload?;
    let profile = state.users.update_profile(user.id, user_id, input).await?;
    Ok(ApiResponse::success(profile))
}
