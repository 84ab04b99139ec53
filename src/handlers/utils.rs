use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::app::HttpSettings;
use crate::error::ApiError;
use crate::services::ServiceError;

/// Path id for `entity`; anything that is not a UUID cannot name a record
pub fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::NotFound(entity).into())
}

/// Base for absolute upload URLs: the configured public URL, else the
/// request's Host header
pub fn base_url(settings: &HttpSettings, headers: &HeaderMap) -> String {
    if let Some(base) = &settings.public_base_url {
        return base.clone();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}
