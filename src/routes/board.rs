use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::board::{
        BoardListItem, BoardSummary, CategoryRequest, CellRequest, RenameBoardRequest,
        ResizeBoardRequest, SaveBoardResponse,
    },
    error::AppError,
    services::board_service,
    state::SharedState,
};

/// Routes handling board authoring, play, and persistence operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/board", get(get_board).put(save_board))
        .route("/board/name", put(rename_board))
        .route("/board/size", put(resize_board))
        .route("/board/categories/{index}", put(set_category))
        .route("/board/cells/{row}/{col}", put(set_cell))
        .route("/board/cells/{row}/{col}/played", post(mark_played))
        .route("/board/play", post(enter_play))
        .route("/board/author", post(enter_author))
        .route("/board/reset", post(reset_progress))
        .route("/boards", get(list_boards))
}

/// Current board and mode, creating the default board on first use.
#[utoipa::path(
    get,
    path = "/board",
    tag = "board",
    responses((status = 200, description = "Current board", body = BoardSummary))
)]
pub async fn get_board(State(state): State<SharedState>) -> Json<BoardSummary> {
    Json(board_service::current_board(&state).await)
}

/// Explicitly persist the in-memory board.
#[utoipa::path(
    put,
    path = "/board",
    tag = "board",
    responses((status = 200, description = "Board saved", body = SaveBoardResponse))
)]
pub async fn save_board(
    State(state): State<SharedState>,
) -> Result<Json<SaveBoardResponse>, AppError> {
    let response = board_service::save_board(&state).await?;
    Ok(Json(response))
}

/// Rename the board.
#[utoipa::path(
    put,
    path = "/board/name",
    tag = "board",
    request_body = RenameBoardRequest,
    responses((status = 200, description = "Board renamed", body = BoardSummary))
)]
pub async fn rename_board(
    State(state): State<SharedState>,
    Json(payload): Json<RenameBoardRequest>,
) -> Result<Json<BoardSummary>, AppError> {
    payload.validate()?;
    Ok(Json(board_service::rename_board(&state, payload).await))
}

/// Resize the grid; out-of-range extents are clamped.
#[utoipa::path(
    put,
    path = "/board/size",
    tag = "board",
    request_body = ResizeBoardRequest,
    responses((status = 200, description = "Board resized", body = BoardSummary))
)]
pub async fn resize_board(
    State(state): State<SharedState>,
    Json(payload): Json<ResizeBoardRequest>,
) -> Json<BoardSummary> {
    Json(board_service::resize_board(&state, payload).await)
}

/// Replace one category label.
#[utoipa::path(
    put,
    path = "/board/categories/{index}",
    tag = "board",
    params(("index" = usize, Path, description = "Zero-based column index")),
    request_body = CategoryRequest,
    responses((status = 200, description = "Category updated", body = BoardSummary))
)]
pub async fn set_category(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<BoardSummary>, AppError> {
    payload.validate()?;
    let summary = board_service::set_category(&state, index, payload).await?;
    Ok(Json(summary))
}

/// Author the cell at the given coordinates.
#[utoipa::path(
    put,
    path = "/board/cells/{row}/{col}",
    tag = "board",
    params(
        ("row" = u32, Path, description = "Zero-based row index"),
        ("col" = u32, Path, description = "Zero-based column index"),
    ),
    request_body = CellRequest,
    responses((status = 200, description = "Cell updated", body = BoardSummary))
)]
pub async fn set_cell(
    State(state): State<SharedState>,
    Path((row, col)): Path<(u32, u32)>,
    Json(payload): Json<CellRequest>,
) -> Result<Json<BoardSummary>, AppError> {
    let summary = board_service::set_cell(&state, row, col, payload).await?;
    Ok(Json(summary))
}

/// Mark a cell completed; only valid in play mode.
#[utoipa::path(
    post,
    path = "/board/cells/{row}/{col}/played",
    tag = "board",
    params(
        ("row" = u32, Path, description = "Zero-based row index"),
        ("col" = u32, Path, description = "Zero-based column index"),
    ),
    responses((status = 200, description = "Cell completed", body = BoardSummary))
)]
pub async fn mark_played(
    State(state): State<SharedState>,
    Path((row, col)): Path<(u32, u32)>,
) -> Result<Json<BoardSummary>, AppError> {
    let summary = board_service::mark_played(&state, row, col).await?;
    Ok(Json(summary))
}

/// Switch to play mode, persisting the board and reconciling progress.
#[utoipa::path(
    post,
    path = "/board/play",
    tag = "board",
    responses((status = 200, description = "Play mode entered", body = BoardSummary))
)]
pub async fn enter_play(
    State(state): State<SharedState>,
) -> Result<Json<BoardSummary>, AppError> {
    let summary = board_service::enter_play(&state).await?;
    Ok(Json(summary))
}

/// Return to authoring mode.
#[utoipa::path(
    post,
    path = "/board/author",
    tag = "board",
    responses((status = 200, description = "Author mode entered", body = BoardSummary))
)]
pub async fn enter_author(
    State(state): State<SharedState>,
) -> Result<Json<BoardSummary>, AppError> {
    let summary = board_service::enter_author(&state).await?;
    Ok(Json(summary))
}

/// Clear all completion flags and delete the stored progress record.
#[utoipa::path(
    post,
    path = "/board/reset",
    tag = "board",
    responses((status = 200, description = "Progress reset", body = BoardSummary))
)]
pub async fn reset_progress(
    State(state): State<SharedState>,
) -> Result<Json<BoardSummary>, AppError> {
    let summary = board_service::reset_progress(&state).await?;
    Ok(Json(summary))
}

/// List all stored boards, newest first.
#[utoipa::path(
    get,
    path = "/boards",
    tag = "board",
    responses((status = 200, description = "Stored boards", body = [BoardListItem]))
)]
pub async fn list_boards(
    State(state): State<SharedState>,
) -> Result<Json<Vec<BoardListItem>>, AppError> {
    let items = board_service::list_boards(&state).await?;
    Ok(Json(items))
}
