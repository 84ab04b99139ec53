use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::utils::{base_url, parse_id};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{
    CreatePinInput, PinSearch, PinView, ServiceError, TagsInput, UpdatePinInput, UploadPinInput, UploadedFile,
};

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
}

/// GET /api/pins?tag=&type= - search every board the caller can read
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<PinSearch>,
) -> ApiResult<Vec<PinView>> {
    let pins = state.pins.search(user.id, filter).await?;
    Ok(ApiResponse::success(pins))
}

/// GET /api/pins/board/:board_id?tag= - pins on one board, newest first
pub async fn list_for_board(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(board_id): Path<String>,
    Query(query): Query<TagQuery>,
) -> ApiResult<Vec<PinView>> {
    let board_id = parse_id(&board_id, "Board")?;
    let pins = state
        .pins
        .list_for_board(user.id, board_id, query.tag.as_deref())
        .await?;
    Ok(ApiResponse::success(pins))
}

/// GET /api/pins/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<PinView> {
    let pin_id = parse_id(&id, "Pin")?;
    let pin = state.pins.get(user.id, pin_id).await?;
    Ok(ApiResponse::success(pin))
}

/// POST /api/pins - pin a remote URL
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreatePinInput>, JsonRejection>,
) -> ApiResult<PinView> {
    let Json(input) = payload?;
    let pin = state.pins.create(user.id, input).await?;
    Ok(ApiResponse::created(pin))
}

/// POST /api/pins/upload - multipart with `file`, `boardId`, `title`, `tags`
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PinView> {
    let limit = state.pins.upload_policy().max_file_bytes;
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut input = UploadPinInput::default();
    let mut tags: Vec<String> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => input.file = read_file(field, limit).await?,
            "boardId" => input.board_id = Some(read_text(field, limit).await?),
            "title" => input.title = Some(read_text(field, limit).await?),
            // Repeated tags fields and comma-separated values both work
            "tags" => tags.push(read_text(field, limit).await?),
            _ => {}
        }
    }
    if !tags.is_empty() {
        input.tags = Some(TagsInput::Csv(tags.join(",")));
    }

    let base = base_url(&state.http, &headers);
    let pin = state.pins.create_from_upload(user.id, input, &base).await?;
    Ok(ApiResponse::created(pin))
}

/// PUT /api/pins/:id - creator only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePinInput>, JsonRejection>,
) -> ApiResult<PinView> {
    let pin_id = parse_id(&id, "Pin")?;
    let Json(input) = payload?;
    let pin = state.pins.update(user.id, pin_id, input).await?;
    Ok(ApiResponse::success(pin))
}

/// DELETE /api/pins/:id - creator only
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let pin_id = parse_id(&id, "Pin")?;
    state.pins.delete(user.id, pin_id).await?;
    Ok(ApiResponse::message("Pin deleted"))
}

/// A file part with no name and no content is an empty form input
async fn read_file(field: Field<'_>, limit: usize) -> Result<Option<UploadedFile>, ApiError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

    if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

async fn read_text(field: Field<'_>, limit: usize) -> Result<String, ApiError> {
    field.text().await.map_err(|e| multipart_error(e, limit))
}

/// Hitting the request body limit means the file was too large
fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::FileTooLarge { limit }.into()
    } else {
        ApiError::bad_request(err.body_text())
    }
}
