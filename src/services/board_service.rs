use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult, ValidationErrors};
use super::validation;
use super::views::{BoardView, Directory};
use crate::database::models::Board;
use crate::database::EntityStore;
use crate::policy;

#[derive(Debug, Default, Deserialize)]
pub struct CreateBoardInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub collaborators: Option<Vec<String>>,
}

/// Partial update. `collaborators`, when present, replaces the whole list.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBoardInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub collaborators: Option<Vec<String>>,
}

pub struct BoardService {
    store: Arc<dyn EntityStore>,
}

pub(crate) async fn load_board(store: &dyn EntityStore, board_id: Uuid) -> ServiceResult<Board> {
    store
        .board_by_id(board_id)
        .await?
        .ok_or(ServiceError::NotFound("Board"))
}

impl BoardService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Boards the user owns or collaborates on, newest first
    pub async fn list_accessible(&self, user_id: Uuid) -> ServiceResult<Vec<BoardView>> {
        let boards = self.store.boards_for_member(user_id).await?;
        let directory = Directory::load(&*self.store, boards.iter().flat_map(Board::member_ids)).await?;
        boards.into_iter().map(|b| directory.board(b)).collect()
    }

    pub async fn get(&self, user_id: Uuid, board_id: Uuid) -> ServiceResult<BoardView> {
        let board = load_board(&*self.store, board_id).await?;
        if !policy::can_read_board(user_id, &board) {
            return Err(ServiceError::Forbidden("Access denied"));
        }
        self.view(board).await
    }

    pub async fn create(&self, user_id: Uuid, input: CreateBoardInput) -> ServiceResult<BoardView> {
        let mut errors = ValidationErrors::new();
        let title = validation::required_text(&mut errors, "title", input.title.as_deref());
        let collaborators = self
            .collaborators(&mut errors, user_id, input.collaborators.as_deref().unwrap_or_default())
            .await?;
        errors.into_result()?;
        let Some(title) = title else {
            return Err(ServiceError::Internal("validated title missing".to_string()));
        };

        let description = validation::optional_text(input.description.as_deref()).unwrap_or_default();
        let board = Board::new(user_id, title, description, collaborators);
        self.store.save_board(&board).await?;

        info!(board_id = %board.id, owner_id = %user_id, "Created board");
        self.view(board).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        board_id: Uuid,
        input: UpdateBoardInput,
    ) -> ServiceResult<BoardView> {
        let mut board = load_board(&*self.store, board_id).await?;
        if !policy::can_mutate_board(user_id, &board) {
            return Err(ServiceError::Forbidden("Only the board owner can update this board"));
        }

        let mut errors = ValidationErrors::new();
        let title = validation::non_blank_if_present(&mut errors, "title", input.title.as_deref());
        let collaborators = match input.collaborators.as_deref() {
            Some(ids) => Some(self.collaborators(&mut errors, board.owner_id, ids).await?),
            None => None,
        };
        errors.into_result()?;

        if let Some(title) = title {
            board.title = title;
        }
        if let Some(description) = validation::optional_text(input.description.as_deref()) {
            board.description = description;
        }
        if let Some(collaborators) = collaborators {
            board.collaborators = collaborators;
        }
        board.updated_at = Utc::now();
        self.store.save_board(&board).await?;

        info!(board_id = %board.id, "Updated board");
        self.view(board).await
    }

    /// Pins on the board are left in place
    pub async fn delete(&self, user_id: Uuid, board_id: Uuid) -> ServiceResult<()> {
        let board = load_board(&*self.store, board_id).await?;
        if !policy::can_mutate_board(user_id, &board) {
            return Err(ServiceError::Forbidden("Only the board owner can delete this board"));
        }
        if !self.store.delete_board(board.id).await? {
            return Err(ServiceError::NotFound("Board"));
        }
        info!(board_id = %board.id, "Deleted board");
        Ok(())
    }

    async fn view(&self, board: Board) -> ServiceResult<BoardView> {
        let directory = Directory::load(&*self.store, board.member_ids()).await?;
        directory.board(board)
    }

    /// Parsed, existing collaborator ids in submission order, without
    /// duplicates or the owner.
    async fn collaborators(
        &self,
        errors: &mut ValidationErrors,
        owner_id: Uuid,
        raw: &[String],
    ) -> ServiceResult<Vec<Uuid>> {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = validation::uuid_list(errors, "collaborators", raw)
            .into_iter()
            .filter(|id| *id != owner_id && seen.insert(*id))
            .collect();

        if !ids.is_empty() {
            let known: HashSet<Uuid> = self
                .store
                .users_by_ids(&ids)
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect();
            for id in ids.iter().filter(|id| !known.contains(id)) {
                errors.add("collaborators", format!("no user with id {}", id));
            }
        }
        Ok(ids)
    }
}
