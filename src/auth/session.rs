//! Server-side session records.
//!
//! `tower-sessions` owns the cookie and the per-request [`Session`]; this
//! module supplies the record store behind it and the helpers that bind a
//! session to a user. Bearer tokens name the same record by id, so ending a
//! session revokes both.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::session::{self, Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tower_sessions::{Expiry, Session};
use uuid::Uuid;

/// Session key holding the authenticated user's id
pub const USER_ID_KEY: &str = "user_id";

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "pinboard_session";

/// Session records held in process memory; lost on restart.
///
/// Expired records are dropped whenever a new session is created and by
/// [`ExpiredDeletion::delete_expired`], which the server runs periodically.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, live or not
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn is_live(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.lock().await;
        records.retain(|_, r| is_live(r, now));
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let mut records = self.records.lock().await;
        match records.get(id) {
            Some(record) if is_live(record, OffsetDateTime::now_utc()) => Ok(Some(record.clone())),
            Some(_) => {
                records.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        self.records.lock().await.retain(|_, r| is_live(r, now));
        Ok(())
    }
}

/// Bind `session` to `user_id` under a fresh id and persist it right away,
/// so the id can also be handed out as a bearer token.
pub async fn establish(session: &Session, user_id: Uuid, expires_at: OffsetDateTime) -> Result<Option<Id>, session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await?;
    session.set_expiry(Some(Expiry::AtDateTime(expires_at)));
    session.save().await?;
    Ok(session.id())
}

/// User a stored record is bound to
pub fn record_user(record: &Record) -> Option<Uuid> {
    record
        .data
        .get(USER_ID_KEY)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
