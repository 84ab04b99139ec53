pub mod auth;
pub mod response;

pub use auth::{bearer_token, session_auth_middleware, session_layer, CurrentUser};
pub use response::{ApiResponse, ApiResult};
