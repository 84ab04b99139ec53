// services/mod.rs - Domain operations behind the HTTP handlers
//
// Every service loads fresh records from the EntityStore, asks the policy
// module for a decision and returns a view or a ServiceError.

pub mod auth_service;
pub mod board_service;
pub mod error;
pub mod pin_service;
pub mod upload;
pub mod user_service;
pub mod validation;
pub mod views;

pub use auth_service::{AuthService, Identity, LoginInput, RegisterInput, SessionGrant};
pub use board_service::{BoardService, CreateBoardInput, UpdateBoardInput};
pub use error::{FieldError, ServiceError, ServiceResult, ValidationErrors};
pub use pin_service::{CreatePinInput, PinSearch, PinService, UpdatePinInput, UploadPinInput};
pub use upload::{FileStore, LocalFileStore, UploadPolicy, UploadedFile};
pub use user_service::{UpdateProfileInput, UserService};
pub use validation::TagsInput;
pub use views::{BoardRef, BoardView, PinView};
