use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A named collection of pins owned by exactly one user.
///
/// `owner_id` never changes after creation. Ownership alone grants full
/// access, so the owner is never required to appear in `collaborators`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner_id: Uuid,
    pub collaborators: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(owner_id: Uuid, title: String, description: String, collaborators: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            owner_id,
            collaborators,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_collaborator(&self, user_id: Uuid) -> bool {
        self.collaborators.contains(&user_id)
    }

    /// Owner and collaborators, owner first
    pub fn member_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(self.collaborators.len() + 1);
        ids.push(self.owner_id);
        ids.extend(self.collaborators.iter().copied());
        ids
    }
}
