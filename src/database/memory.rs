use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Board, Pin, User};
use super::store::{EntityStore, PinQuery};

/// Records tagged with their insertion sequence, used to break
/// `created_at` ties so listings stay newest-first.
struct Table<T> {
    rows: HashMap<Uuid, (u64, T)>,
    next_seq: u64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_seq: 0,
        }
    }

    fn get(&self, id: &Uuid) -> Option<T> {
        self.rows.get(id).map(|(_, row)| row.clone())
    }

    /// Replace in place, keeping the original sequence
    fn upsert(&mut self, id: Uuid, row: T) {
        match self.rows.get_mut(&id) {
            Some((_, existing)) => *existing = row,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.rows.insert(id, (seq, row));
            }
        }
    }

    fn remove(&mut self, id: &Uuid) -> bool {
        self.rows.remove(id).is_some()
    }

    /// Rows passing `keep`, newest-created first
    fn select<K: Ord>(&self, keep: impl Fn(&T) -> bool, created: impl Fn(&T) -> K) -> Vec<T> {
        let mut hits: Vec<&(u64, T)> = self.rows.values().filter(|(_, row)| keep(row)).collect();
        hits.sort_by(|(a_seq, a), (b_seq, b)| {
            created(b)
                .cmp(&created(a))
                .then_with(|| b_seq.cmp(a_seq))
        });
        hits.into_iter().map(|(_, row)| row.clone()).collect()
    }
}

/// Process-local entity store, used when no DATABASE_URL is configured and
/// throughout the test suite.
pub struct MemoryStore {
    users: RwLock<Table<User>>,
    boards: RwLock<Table<Board>>,
    pins: RwLock<Table<Pin>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Table::new()),
            boards: RwLock::new(Table::new()),
            pins: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.rows.values().any(|(_, u)| u.email == user.email) {
            return Err(DatabaseError::Duplicate("email"));
        }
        users.upsert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.get(&user.id).is_none() {
            return Err(DatabaseError::Corrupt(format!("user {} does not exist", user.id)));
        }
        users.upsert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users
            .rows
            .values()
            .find(|(_, u)| u.email == email)
            .map(|(_, u)| u.clone()))
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id)).collect())
    }

    async fn save_board(&self, board: &Board) -> Result<(), DatabaseError> {
        self.boards.write().await.upsert(board.id, board.clone());
        Ok(())
    }

    async fn board_by_id(&self, id: Uuid) -> Result<Option<Board>, DatabaseError> {
        Ok(self.boards.read().await.get(&id))
    }

    async fn boards_for_member(&self, user_id: Uuid) -> Result<Vec<Board>, DatabaseError> {
        let boards = self.boards.read().await;
        Ok(boards.select(
            |b| b.is_owner(user_id) || b.is_collaborator(user_id),
            |b| b.created_at,
        ))
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.boards.write().await.remove(&id))
    }

    async fn save_pin(&self, pin: &Pin) -> Result<(), DatabaseError> {
        self.pins.write().await.upsert(pin.id, pin.clone());
        Ok(())
    }

    async fn pin_by_id(&self, id: Uuid) -> Result<Option<Pin>, DatabaseError> {
        Ok(self.pins.read().await.get(&id))
    }

    async fn find_pins(&self, query: &PinQuery) -> Result<Vec<Pin>, DatabaseError> {
        let pins = self.pins.read().await;
        Ok(pins.select(|p| query.matches(p), |p| p.created_at))
    }

    async fn delete_pin(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.pins.write().await.remove(&id))
    }
}
