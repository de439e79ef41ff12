use std::time::SystemTime;

use tracing::warn;

use crate::{
    dto::board::{
        BoardListItem, BoardSummary, CategoryRequest, CellRequest, RenameBoardRequest,
        ResizeBoardRequest, SaveBoardResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        board::{Board, CellKey, DEFAULT_BOARD_ID, Progress},
        state_machine::{BoardEvent, BoardPhase},
    },
};

/// Current board and mode, materializing and persisting the default board
/// on the very first call.
pub async fn current_board(state: &SharedState) -> BoardSummary {
    let board = ensure_board(state).await;
    summarize(state, board).await
}

/// Explicitly persist the in-memory board (full overwrite by identity).
pub async fn save_board(state: &SharedState) -> Result<SaveBoardResponse, ServiceError> {
    ensure_board(state).await;
    let store = state.require_board_store().await?;

    let board = {
        let mut slot = state.board().write().await;
        let mut board = slot.take().unwrap_or_else(Board::new_default);
        board.updated_at = SystemTime::now();
        *slot = Some(board.clone());
        board
    };

    let id = store.save_board(board.into()).await?;
    Ok(SaveBoardResponse { id })
}

/// Replace the board name.
pub async fn rename_board(state: &SharedState, request: RenameBoardRequest) -> BoardSummary {
    let board = update_board(state, |board| board.with_name(request.name)).await;
    summarize(state, board).await
}

/// Resize the grid. Out-of-range extents are clamped; changing the column
/// count resizes the category sequence.
pub async fn resize_board(state: &SharedState, request: ResizeBoardRequest) -> BoardSummary {
    let board = update_board(state, |mut board| {
        if let Some(rows) = request.rows {
            board = board.with_rows(rows);
        }
        if let Some(columns) = request.columns {
            board = board.with_columns(columns);
        }
        board
    })
    .await;
    summarize(state, board).await
}

/// Replace one category label.
pub async fn set_category(
    state: &SharedState,
    index: usize,
    request: CategoryRequest,
) -> Result<BoardSummary, ServiceError> {
    let board = ensure_board(state).await;
    if index >= board.categories.len() {
        return Err(ServiceError::InvalidInput(format!(
            "category index {index} is out of range (the board has {} columns)",
            board.columns
        )));
    }

    let board = update_board(state, |board| board.with_category(index, request.label)).await;
    Ok(summarize(state, board).await)
}

/// Author the cell at `(row, col)`. Editing always clears the completion
/// flag, even when the cell had already been played.
pub async fn set_cell(
    state: &SharedState,
    row: u32,
    col: u32,
    request: CellRequest,
) -> Result<BoardSummary, ServiceError> {
    let board = ensure_board(state).await;
    if row >= board.rows || col >= board.columns {
        return Err(ServiceError::InvalidInput(format!(
            "cell ({row}, {col}) is outside the {}x{} grid",
            board.rows, board.columns
        )));
    }

    let key = CellKey::new(row, col);
    let board =
        update_board(state, |board| board.with_cell(key, request.question, request.answer)).await;
    Ok(summarize(state, board).await)
}

/// Mark the cell at `(row, col)` completed and persist the full
/// completed-key list. Only valid in play mode; unauthored coordinates are
/// a guarded no-op.
pub async fn mark_played(
    state: &SharedState,
    row: u32,
    col: u32,
) -> Result<BoardSummary, ServiceError> {
    let phase = state.phase().await;
    if phase != BoardPhase::Play {
        return Err(ServiceError::InvalidState(
            "cells can only be completed in play mode".into(),
        ));
    }

    let board = ensure_board(state).await;
    let key = CellKey::new(row, col);
    if board.cell(key).is_none() {
        return Ok(BoardSummary::from((board, phase)));
    }

    let board = update_board(state, |board| board.with_played(key)).await;

    // The in-memory flag stays flipped even when the save below fails; the
    // caller is notified and can keep playing from the last good state.
    let store = state.require_board_store().await?;
    store.save_progress((&board).into()).await?;

    Ok(BoardSummary::from((board, phase)))
}

/// Clear every completion flag and delete the stored progress record.
pub async fn reset_progress(state: &SharedState) -> Result<BoardSummary, ServiceError> {
    let board = update_board(state, Board::cleared).await;

    let store = state.require_board_store().await?;
    store.reset_progress(board.id).await?;

    Ok(summarize(state, board).await)
}

/// Switch to play mode: persist the board, then reconcile stored progress
/// into the in-memory completion flags.
///
/// A failed board save aborts the transition; a failed (or malformed)
/// progress load is tolerated with a warning, and play begins with the
/// flags already in memory.
pub async fn enter_play(state: &SharedState) -> Result<BoardSummary, ServiceError> {
    ensure_board(state).await;

    let (board, phase) = state
        .run_transition(BoardEvent::EnterPlay, || async {
            let store = state.require_board_store().await?;

            let mut board = {
                let guard = state.board().read().await;
                guard.clone().unwrap_or_else(Board::new_default)
            };
            board.updated_at = SystemTime::now();
            store.save_board(board.clone().into()).await?;

            match store.find_progress(board.id).await {
                Ok(Some(entity)) => match Progress::try_from(entity) {
                    Ok(progress) => board = board.apply_progress(&progress),
                    Err(err) => {
                        warn!(error = %err, "ignoring malformed play progress record");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        error = %err,
                        "failed to load play progress; starting play with the in-memory completion flags"
                    );
                }
            }

            let mut slot = state.board().write().await;
            *slot = Some(board.clone());
            drop(slot);

            Ok(board)
        })
        .await?;

    Ok(BoardSummary::from((board, phase)))
}

/// Switch back to authoring. No persistence side effect.
pub async fn enter_author(state: &SharedState) -> Result<BoardSummary, ServiceError> {
    let board = ensure_board(state).await;
    let (_, phase) = state
        .run_transition(BoardEvent::ExitPlay, || async { Ok(()) })
        .await?;
    Ok(BoardSummary::from((board, phase)))
}

/// All stored boards, newest first.
pub async fn list_boards(state: &SharedState) -> Result<Vec<BoardListItem>, ServiceError> {
    let store = state.require_board_store().await?;
    let items = store.list_boards().await?;
    Ok(items.into_iter().map(Into::into).collect())
}

/// Return the in-memory board, bootstrapping it on first use: load the
/// stored record, or materialize the default board and persist it. Every
/// failure path falls back to an in-memory default so the caller always
/// gets a board to work with.
async fn ensure_board(state: &SharedState) -> Board {
    {
        let guard = state.board().read().await;
        if let Some(board) = guard.as_ref() {
            return board.clone();
        }
    }

    let board = bootstrap_board(state).await;

    let mut slot = state.board().write().await;
    if let Some(existing) = slot.as_ref() {
        // Another caller bootstrapped while we were loading.
        return existing.clone();
    }
    *slot = Some(board.clone());
    board
}

async fn bootstrap_board(state: &SharedState) -> Board {
    let Some(store) = state.board_store().await else {
        warn!("storage unavailable (degraded mode); starting from an in-memory default board");
        return Board::new_default();
    };

    match store.find_board(DEFAULT_BOARD_ID).await {
        Ok(Some(entity)) => match Board::try_from(entity) {
            Ok(board) => board,
            Err(err) => {
                warn!(error = %err, "stored board is malformed; starting from defaults");
                Board::new_default()
            }
        },
        Ok(None) => {
            let board = Board::new_default();
            if let Err(err) = store.save_board(board.clone().into()).await {
                warn!(error = %err, "failed to persist the freshly created board");
            }
            board
        }
        Err(err) => {
            warn!(error = %err, "failed to load board; starting from an in-memory default");
            Board::new_default()
        }
    }
}

async fn update_board<F>(state: &SharedState, mutate: F) -> Board
where
    F: FnOnce(Board) -> Board,
{
    ensure_board(state).await;
    let mut slot = state.board().write().await;
    let board = mutate(slot.take().unwrap_or_else(Board::new_default));
    *slot = Some(board.clone());
    board
}

async fn summarize(state: &SharedState, board: Board) -> BoardSummary {
    let phase = state.phase().await;
    BoardSummary::from((board, phase))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::SystemTime};

    use super::*;
    use crate::{
        dao::{board_store::memory::MemoryBoardStore, models::ProgressEntity},
        state::AppState,
    };

    async fn state_with_storage() -> SharedState {
        let state = AppState::new();
        state
            .install_board_store(Arc::new(MemoryBoardStore::default()))
            .await;
        state
    }

    fn capital_of_france() -> CellRequest {
        CellRequest {
            question: "Capital of France?".into(),
            answer: "Paris".into(),
        }
    }

    #[tokio::test]
    async fn first_call_materializes_and_persists_the_default_board() {
        let state = state_with_storage().await;

        let summary = current_board(&state).await;
        assert_eq!(summary.id, DEFAULT_BOARD_ID);
        assert_eq!(summary.name, "My Trivia Game");
        assert_eq!((summary.rows, summary.columns), (5, 5));
        assert_eq!(summary.categories[0], "Category 1");
        assert_eq!(summary.categories[4], "Category 5");
        assert!(summary.cells.is_empty());

        let store = state.require_board_store().await.unwrap();
        assert!(store.find_board(DEFAULT_BOARD_ID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bootstrap_without_storage_falls_back_to_defaults() {
        let state = AppState::new();
        let summary = current_board(&state).await;
        assert_eq!(summary.name, "My Trivia Game");
        assert!(state.is_degraded());
    }

    #[tokio::test]
    async fn authoring_then_playing_records_progress() {
        let state = state_with_storage().await;

        let summary = set_cell(&state, 0, 0, capital_of_france()).await.unwrap();
        let cell = &summary.cells["0-0"];
        assert_eq!(cell.points, 100);
        assert!(!cell.played);

        let summary = enter_play(&state).await.unwrap();
        assert!(matches!(summary.mode, crate::dto::board::ModeDto::Play));
        assert!(!summary.cells["0-0"].played);

        let summary = mark_played(&state, 0, 0).await.unwrap();
        assert!(summary.cells["0-0"].played);

        let store = state.require_board_store().await.unwrap();
        let progress = store
            .find_progress(DEFAULT_BOARD_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.completed_cells, vec!["0-0".to_string()]);
    }

    #[tokio::test]
    async fn mark_played_is_rejected_in_author_mode() {
        let state = state_with_storage().await;
        set_cell(&state, 0, 0, capital_of_france()).await.unwrap();

        let err = mark_played(&state, 0, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let summary = current_board(&state).await;
        assert!(!summary.cells["0-0"].played);
    }

    #[tokio::test]
    async fn marking_an_unauthored_cell_saves_no_progress() {
        let state = state_with_storage().await;
        enter_play(&state).await.unwrap();

        mark_played(&state, 4, 4).await.unwrap();

        let store = state.require_board_store().await.unwrap();
        assert!(
            store
                .find_progress(DEFAULT_BOARD_ID)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn entering_play_reconciles_stored_progress() {
        let state = state_with_storage().await;
        let store = state.require_board_store().await.unwrap();

        let board =
            Board::new_default().with_cell(CellKey::new(1, 2), "Q".into(), "A".into());
        store.save_board(board.into()).await.unwrap();
        store
            .save_progress(ProgressEntity {
                board_id: DEFAULT_BOARD_ID,
                completed_cells: vec!["1-2".into()],
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();

        let summary = enter_play(&state).await.unwrap();
        assert!(summary.cells["1-2"].played);
    }

    #[tokio::test]
    async fn entering_play_persists_the_board_first() {
        let state = state_with_storage().await;
        rename_board(
            &state,
            RenameBoardRequest {
                name: "Friday Night Trivia".into(),
            },
        )
        .await;

        enter_play(&state).await.unwrap();

        let store = state.require_board_store().await.unwrap();
        let stored = store.find_board(DEFAULT_BOARD_ID).await.unwrap().unwrap();
        assert_eq!(stored.name, "Friday Night Trivia");
    }

    #[tokio::test]
    async fn malformed_stored_progress_does_not_block_play_mode() {
        let state = state_with_storage().await;
        let store = state.require_board_store().await.unwrap();
        store
            .save_progress(ProgressEntity {
                board_id: DEFAULT_BOARD_ID,
                completed_cells: vec!["not a key".into()],
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();

        let summary = enter_play(&state).await.unwrap();
        assert!(matches!(summary.mode, crate::dto::board::ModeDto::Play));
    }

    #[tokio::test]
    async fn entering_play_twice_is_a_conflict() {
        let state = state_with_storage().await;
        enter_play(&state).await.unwrap();
        let err = enter_play(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn reset_clears_flags_and_deletes_the_progress_record() {
        let state = state_with_storage().await;
        set_cell(&state, 0, 0, capital_of_france()).await.unwrap();
        enter_play(&state).await.unwrap();
        mark_played(&state, 0, 0).await.unwrap();

        let summary = reset_progress(&state).await.unwrap();
        assert!(!summary.cells["0-0"].played);

        let store = state.require_board_store().await.unwrap();
        assert!(
            store
                .find_progress(DEFAULT_BOARD_ID)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn editing_a_played_cell_clears_its_completion() {
        let state = state_with_storage().await;
        set_cell(&state, 0, 0, capital_of_france()).await.unwrap();
        enter_play(&state).await.unwrap();
        mark_played(&state, 0, 0).await.unwrap();
        enter_author(&state).await.unwrap();

        let summary = set_cell(&state, 0, 0, capital_of_france()).await.unwrap();
        assert!(!summary.cells["0-0"].played);
    }

    #[tokio::test]
    async fn resizing_clamps_extents_and_pads_categories() {
        let state = state_with_storage().await;
        let summary = resize_board(
            &state,
            ResizeBoardRequest {
                rows: Some(0),
                columns: Some(99),
            },
        )
        .await;
        assert_eq!((summary.rows, summary.columns), (1, 10));
        assert_eq!(summary.categories.len(), 10);
        assert_eq!(summary.categories[9], "Category 10");
    }

    #[tokio::test]
    async fn category_edits_out_of_range_are_rejected() {
        let state = state_with_storage().await;
        let err = set_category(
            &state,
            7,
            CategoryRequest {
                label: "History".into(),
            },
        )
        .await;
        assert!(matches!(err, Err(ServiceError::InvalidInput(_))));

        let summary = set_category(
            &state,
            0,
            CategoryRequest {
                label: "History".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.categories[0], "History");
    }

    #[tokio::test]
    async fn cell_edits_outside_the_grid_are_rejected() {
        let state = state_with_storage().await;
        let err = set_cell(&state, 5, 0, capital_of_france()).await;
        assert!(matches!(err, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn explicit_save_round_trips_through_storage() {
        let state = state_with_storage().await;
        rename_board(
            &state,
            RenameBoardRequest {
                name: "Quiz Night".into(),
            },
        )
        .await;

        let response = save_board(&state).await.unwrap();
        assert_eq!(response.id, DEFAULT_BOARD_ID);

        let store = state.require_board_store().await.unwrap();
        let stored = store.find_board(DEFAULT_BOARD_ID).await.unwrap().unwrap();
        assert_eq!(stored.name, "Quiz Night");

        let listing = list_boards(&state).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "Quiz Night");
    }
}
