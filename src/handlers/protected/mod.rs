// handlers/protected/mod.rs - Endpoints behind session_auth_middleware
//
// Handlers receive the caller as Extension<CurrentUser>.

pub mod boards;
pub mod pins;
pub mod profile;
