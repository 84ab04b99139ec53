use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::session::Id;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{MemorySessionStore, SESSION_COOKIE};
use crate::error::ApiError;

/// Authenticated caller, injected into request extensions
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub session_id: Id,
}

/// Cookie session layer: `HttpOnly`, `SameSite=Lax`, path `/`
pub fn session_layer(
    store: MemorySessionStore,
    secure: bool,
    lifetime_hours: u64,
) -> SessionManagerLayer<MemorySessionStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(lifetime_hours as i64)))
}

/// Session authentication middleware: resolves the caller from a bearer
/// token or the session cookie and rejects the request otherwise
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = bearer_token(request.headers());
    let identity = state.auth.authenticate(&session, bearer.as_deref()).await?;

    request.extensions_mut().insert(CurrentUser {
        id: identity.user_id,
        session_id: identity.session_id,
    });

    Ok(next.run(request).await)
}

/// Token from `Authorization: Bearer`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn ignores_empty_or_foreign_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
