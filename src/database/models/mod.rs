pub mod board;
pub mod pin;
pub mod user;

pub use board::Board;
pub use pin::{Pin, PinType};
pub use user::{PasswordHash, User, UserProfile, UserSummary};
