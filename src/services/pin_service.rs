use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::board_service::load_board;
use super::error::{ServiceError, ServiceResult, ValidationErrors};
use super::upload::{self, FileStore, UploadPolicy, UploadedFile};
use super::validation::{self, TagsInput};
use super::views::{Directory, PinView};
use crate::database::models::{Board, Pin};
use crate::database::{EntityStore, PinQuery};
use crate::policy;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePinInput {
    pub board_id: Option<String>,
    #[serde(rename = "type")]
    pub pin_type: Option<String>,
    pub content_url: Option<String>,
    pub title: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Partial update. `tags`, when present, replaces the whole list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePinInput {
    #[serde(rename = "type")]
    pub pin_type: Option<String>,
    pub content_url: Option<String>,
    pub title: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Text fields of a multipart upload plus the file itself
#[derive(Debug, Default)]
pub struct UploadPinInput {
    pub board_id: Option<String>,
    pub title: Option<String>,
    pub tags: Option<TagsInput>,
    pub file: Option<UploadedFile>,
}

/// Filters for searching across every accessible board
#[derive(Debug, Default, Deserialize)]
pub struct PinSearch {
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub pin_type: Option<String>,
}

pub struct PinService {
    store: Arc<dyn EntityStore>,
    files: Arc<dyn FileStore>,
    uploads: UploadPolicy,
}

impl PinService {
    pub fn new(store: Arc<dyn EntityStore>, files: Arc<dyn FileStore>, uploads: UploadPolicy) -> Self {
        Self { store, files, uploads }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        self.uploads
    }

    /// Pins on one readable board, optionally narrowed to an exact tag
    pub async fn list_for_board(
        &self,
        user_id: Uuid,
        board_id: Uuid,
        tag: Option<&str>,
    ) -> ServiceResult<Vec<PinView>> {
        let board = self.readable_board(user_id, board_id).await?;
        let query = PinQuery {
            tag: validation::tag_filter(tag),
            ..PinQuery::for_boards(vec![board.id])
        };
        self.views(self.store.find_pins(&query).await?, &[board]).await
    }

    /// Pins across every board the user can read. Orphaned pins are not
    /// included; they are reachable by id only.
    pub async fn search(&self, user_id: Uuid, filter: PinSearch) -> ServiceResult<Vec<PinView>> {
        let mut errors = ValidationErrors::new();
        let pin_type = filter
            .pin_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .and_then(|t| validation::pin_type(&mut errors, "type", t));
        errors.into_result()?;

        let boards = self.store.boards_for_member(user_id).await?;
        let query = PinQuery {
            board_ids: boards.iter().map(|b| b.id).collect(),
            tag: validation::tag_filter(filter.tag.as_deref()),
            pin_type,
        };
        self.views(self.store.find_pins(&query).await?, &boards).await
    }

    pub async fn get(&self, user_id: Uuid, pin_id: Uuid) -> ServiceResult<PinView> {
        let pin = self.load_pin(pin_id).await?;
        let board = self.store.board_by_id(pin.board_id).await?;
        if !policy::can_read_pin(user_id, &pin, board.as_ref()) {
            return Err(ServiceError::Forbidden("Access denied"));
        }
        self.view(pin, board.as_ref()).await
    }

    pub async fn create(&self, user_id: Uuid, input: CreatePinInput) -> ServiceResult<PinView> {
        let mut errors = ValidationErrors::new();
        let board_id = validation::required_text(&mut errors, "boardId", input.board_id.as_deref())
            .and_then(|raw| validation::uuid(&mut errors, "boardId", &raw));
        let pin_type = validation::required_text(&mut errors, "type", input.pin_type.as_deref())
            .and_then(|raw| validation::pin_type(&mut errors, "type", &raw));
        let content_url = validation::required_text(&mut errors, "contentUrl", input.content_url.as_deref());
        let title = validation::required_text(&mut errors, "title", input.title.as_deref());
        errors.into_result()?;
        let (Some(board_id), Some(pin_type), Some(content_url), Some(title)) =
            (board_id, pin_type, content_url, title)
        else {
            return Err(ServiceError::Internal("validated pin fields missing".to_string()));
        };

        let board = self.writable_board(user_id, board_id).await?;
        let tags = input.tags.map(|t| t.normalize()).unwrap_or_default();
        let pin = Pin::new(board.id, user_id, pin_type, content_url, title, tags);
        self.store.save_pin(&pin).await?;

        info!(pin_id = %pin.id, board_id = %board.id, pin_type = %pin.pin_type, "Created pin");
        self.view(pin, Some(&board)).await
    }

    /// File checks come first, then the board. The stored file is removed
    /// again if the pin cannot be saved.
    pub async fn create_from_upload(
        &self,
        user_id: Uuid,
        input: UploadPinInput,
        base_url: &str,
    ) -> ServiceResult<PinView> {
        let file = input.file.ok_or(ServiceError::NoFile)?;
        let pin_type = self.uploads.check(&file)?;

        let mut errors = ValidationErrors::new();
        let board_id = validation::required_text(&mut errors, "boardId", input.board_id.as_deref())
            .and_then(|raw| validation::uuid(&mut errors, "boardId", &raw));
        let title = validation::required_text(&mut errors, "title", input.title.as_deref());
        errors.into_result()?;
        let (Some(board_id), Some(title)) = (board_id, title) else {
            return Err(ServiceError::Internal("validated upload fields missing".to_string()));
        };

        let board = self.writable_board(user_id, board_id).await?;

        let file_name = upload::stored_file_name(&file, Utc::now());
        self.files
            .save(&file_name, &file.bytes)
            .await
            .map_err(ServiceError::UploadStorage)?;

        let tags = input.tags.map(|t| t.normalize()).unwrap_or_default();
        let content_url = upload::public_url(base_url, &file_name);
        let pin = Pin::new(board.id, user_id, pin_type, content_url, title, tags);
        if let Err(e) = self.store.save_pin(&pin).await {
            if let Err(cleanup) = self.files.remove(&file_name).await {
                error!(file = %file_name, "Failed to remove orphaned upload: {}", cleanup);
            }
            return Err(e.into());
        }

        info!(pin_id = %pin.id, board_id = %board.id, file = %file_name, bytes = file.bytes.len(), "Uploaded pin");
        self.view(pin, Some(&board)).await
    }

    pub async fn update(&self, user_id: Uuid, pin_id: Uuid, input: UpdatePinInput) -> ServiceResult<PinView> {
        let mut pin = self.load_pin(pin_id).await?;
        if !policy::can_mutate_pin(user_id, &pin) {
            return Err(ServiceError::Forbidden("Only the pin creator can update this pin"));
        }

        let mut errors = ValidationErrors::new();
        let pin_type = validation::non_blank_if_present(&mut errors, "type", input.pin_type.as_deref())
            .and_then(|raw| validation::pin_type(&mut errors, "type", &raw));
        let content_url =
            validation::non_blank_if_present(&mut errors, "contentUrl", input.content_url.as_deref());
        let title = validation::non_blank_if_present(&mut errors, "title", input.title.as_deref());
        errors.into_result()?;

        if let Some(pin_type) = pin_type {
            pin.pin_type = pin_type;
        }
        if let Some(content_url) = content_url {
            pin.content_url = content_url;
        }
        if let Some(title) = title {
            pin.title = title;
        }
        if let Some(tags) = input.tags {
            pin.tags = tags.normalize();
        }
        pin.updated_at = Utc::now();
        self.store.save_pin(&pin).await?;

        info!(pin_id = %pin.id, "Updated pin");
        let board = self.store.board_by_id(pin.board_id).await?;
        self.view(pin, board.as_ref()).await
    }

    pub async fn delete(&self, user_id: Uuid, pin_id: Uuid) -> ServiceResult<()> {
        let pin = self.load_pin(pin_id).await?;
        if !policy::can_mutate_pin(user_id, &pin) {
            return Err(ServiceError::Forbidden("Only the pin creator can delete this pin"));
        }
        if !self.store.delete_pin(pin.id).await? {
            return Err(ServiceError::NotFound("Pin"));
        }
        info!(pin_id = %pin.id, "Deleted pin");
        Ok(())
    }

    async fn load_pin(&self, pin_id: Uuid) -> ServiceResult<Pin> {
        self.store
            .pin_by_id(pin_id)
            .await?
            .ok_or(ServiceError::NotFound("Pin"))
    }

    async fn readable_board(&self, user_id: Uuid, board_id: Uuid) -> ServiceResult<Board> {
        let board = load_board(&*self.store, board_id).await?;
        if !policy::can_read_board(user_id, &board) {
            return Err(ServiceError::Forbidden("Access denied"));
        }
        Ok(board)
    }

    async fn writable_board(&self, user_id: Uuid, board_id: Uuid) -> ServiceResult<Board> {
        let board = load_board(&*self.store, board_id).await?;
        if !policy::can_create_pin(user_id, &board) {
            return Err(ServiceError::Forbidden("Access denied"));
        }
        Ok(board)
    }

    async fn view(&self, pin: Pin, board: Option<&Board>) -> ServiceResult<PinView> {
        let directory = Directory::load(&*self.store, [pin.creator_id]).await?;
        directory.pin(pin, board)
    }

    async fn views(&self, pins: Vec<Pin>, boards: &[Board]) -> ServiceResult<Vec<PinView>> {
        let directory = Directory::load(&*self.store, pins.iter().map(|p| p.creator_id)).await?;
        pins.into_iter()
            .map(|pin| {
                let board = boards.iter().find(|b| b.id == pin.board_id);
                directory.pin(pin, board)
            })
            .collect()
    }
}
