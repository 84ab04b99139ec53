use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::error::ServiceResult;
use crate::database::models::{Board, Pin, PinType, UserSummary};
use crate::database::{DatabaseError, EntityStore};

/// Board as returned to clients, with member ids resolved to identities
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner: UserSummary,
    pub collaborators: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardRef {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinView {
    pub id: Uuid,
    pub board_id: Uuid,
    /// `None` once the board has been deleted
    pub board: Option<BoardRef>,
    #[serde(rename = "type")]
    pub pin_type: PinType,
    pub content_url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub creator: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Id-to-identity lookup built with one store round trip
pub(crate) struct Directory {
    users: HashMap<Uuid, UserSummary>,
}

impl Directory {
    pub async fn load(store: &dyn EntityStore, ids: impl IntoIterator<Item = Uuid>) -> ServiceResult<Self> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        let users = store
            .users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.summary()))
            .collect();
        Ok(Self { users })
    }

    /// Owners and creators must resolve; a missing one is a storage fault
    fn required(&self, id: Uuid) -> ServiceResult<UserSummary> {
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::Corrupt(format!("user {} referenced but missing", id)).into())
    }

    pub fn board(&self, board: Board) -> ServiceResult<BoardView> {
        let owner = self.required(board.owner_id)?;
        let collaborators = board
            .collaborators
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect();
        Ok(BoardView {
            id: board.id,
            title: board.title,
            description: board.description,
            owner,
            collaborators,
            created_at: board.created_at,
            updated_at: board.updated_at,
        })
    }

    pub fn pin(&self, pin: Pin, board: Option<&Board>) -> ServiceResult<PinView> {
        let creator = self.required(pin.creator_id)?;
        Ok(PinView {
            id: pin.id,
            board_id: pin.board_id,
            board: board.map(|b| BoardRef {
                id: b.id,
                title: b.title.clone(),
            }),
            pin_type: pin.pin_type,
            content_url: pin.content_url,
            title: pin.title,
            tags: pin.tags,
            creator,
            created_at: pin.created_at,
            updated_at: pin.updated_at,
        })
    }
}
