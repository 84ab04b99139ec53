use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{BoardView, CreateBoardInput, UpdateBoardInput};

/// GET /api/boards - boards owned by or shared with the caller, newest first
pub async fn list(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> ApiResult<Vec<BoardView>> {
    let boards = state.boards.list_accessible(user.id).await?;
    Ok(ApiResponse::success(boards))
}

/// GET /api/boards/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<BoardView> {
    let board_id = parse_id(&id, "Board")?;
    let board = state.boards.get(user.id, board_id).await?;
    Ok(ApiResponse::success(board))
}

/// POST /api/boards - caller becomes the owner
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateBoardInput>, JsonRejection>,
) -> ApiResult<BoardView> {
    let Json(input) = payload?;
    let board = state.boards.create(user.id, input).await?;
    Ok(ApiResponse::created(board))
}

/// PUT /api/boards/:id - owner only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBoardInput>, JsonRejection>,
) -> ApiResult<BoardView> {
    let board_id = parse_id(&id, "Board")?;
    let Json(input) = payload?;
    let board = state.boards.update(user.id, board_id, input).await?;
    Ok(ApiResponse::success(board))
}

/// DELETE /api/boards/:id - owner only; pins on the board are kept
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let board_id = parse_id(&id, "Board")?;
    state.boards.delete(user.id, board_id).await?;
    Ok(ApiResponse::message("Board deleted"))
}
