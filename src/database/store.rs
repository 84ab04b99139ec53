use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Board, Pin, PinType, User};

/// Pin lookup restricted to a set of boards.
///
/// `tag` must already be normalized (lowercase, trimmed); it matches a whole
/// tag, never a substring.
#[derive(Debug, Clone, Default)]
pub struct PinQuery {
    pub board_ids: Vec<Uuid>,
    pub tag: Option<String>,
    pub pin_type: Option<PinType>,
}

impl PinQuery {
    pub fn for_boards(board_ids: Vec<Uuid>) -> Self {
        Self {
            board_ids,
            ..Default::default()
        }
    }

    pub fn matches(&self, pin: &Pin) -> bool {
        self.board_ids.contains(&pin.board_id)
            && self.tag.as_deref().map_or(true, |tag| pin.has_tag(tag))
            && self.pin_type.map_or(true, |t| pin.pin_type == t)
    }
}

/// Persistent records for users, boards and pins.
///
/// Every write replaces a whole record; there are no multi-record
/// transactions. Listings are ordered newest-created first.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Fails with `DatabaseError::Duplicate("email")` when the email is taken
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError>;
    async fn update_user(&self, user: &User) -> Result<(), DatabaseError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    /// Users that exist among `ids`, in no particular order
    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError>;

    /// Insert or replace
    async fn save_board(&self, board: &Board) -> Result<(), DatabaseError>;
    async fn board_by_id(&self, id: Uuid) -> Result<Option<Board>, DatabaseError>;
    /// Boards owned by or shared with `user_id`
    async fn boards_for_member(&self, user_id: Uuid) -> Result<Vec<Board>, DatabaseError>;
    /// Returns whether a record was removed. Pins are left untouched.
    async fn delete_board(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Insert or replace
    async fn save_pin(&self, pin: &Pin) -> Result<(), DatabaseError>;
    async fn pin_by_id(&self, id: Uuid) -> Result<Option<Pin>, DatabaseError>;
    async fn find_pins(&self, query: &PinQuery) -> Result<Vec<Pin>, DatabaseError>;
    async fn delete_pin(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
