use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::BoardListItemEntity,
    dto::format_system_time,
    state::{
        board::{Board, Cell, CellKey},
        state_machine::BoardPhase,
    },
};

/// Current mode of the board as exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModeDto {
    /// Content is being created or edited.
    Author,
    /// The board is being played.
    Play,
}

impl From<BoardPhase> for ModeDto {
    fn from(phase: BoardPhase) -> Self {
        match phase {
            BoardPhase::Author => ModeDto::Author,
            BoardPhase::Play => ModeDto::Play,
        }
    }
}

/// Public projection of one authored cell.
#[derive(Debug, Serialize, ToSchema)]
pub struct CellSummary {
    pub question: String,
    pub answer: String,
    pub played: bool,
    /// Derived from the row position, never stored.
    pub points: u32,
}

/// Full board projection returned by most board operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardSummary {
    pub id: i64,
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    pub categories: Vec<String>,
    /// Authored cells keyed by their `"{row}-{col}"` coordinate.
    pub cells: BTreeMap<String, CellSummary>,
    pub mode: ModeDto,
    pub created_at: String,
    pub updated_at: String,
}

impl CellSummary {
    fn new(key: CellKey, cell: &Cell) -> Self {
        Self {
            question: cell.question.clone(),
            answer: cell.answer.clone(),
            played: cell.played,
            points: Board::points(key.row),
        }
    }
}

impl From<(Board, BoardPhase)> for BoardSummary {
    fn from((board, phase): (Board, BoardPhase)) -> Self {
        let cells = board
            .cells
            .iter()
            .map(|(key, cell)| (key.to_string(), CellSummary::new(*key, cell)))
            .collect();

        Self {
            id: board.id,
            name: board.name,
            rows: board.rows,
            columns: board.columns,
            categories: board.categories,
            cells,
            mode: phase.into(),
            created_at: format_system_time(board.created_at),
            updated_at: format_system_time(board.updated_at),
        }
    }
}

/// Confirmation returned by the explicit save operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveBoardResponse {
    /// Identity the board was stored under.
    pub id: i64,
}

/// Payload renaming the board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenameBoardRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Payload resizing the grid. Out-of-range extents are clamped, not
/// rejected; omitted fields leave the extent unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResizeBoardRequest {
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub columns: Option<u32>,
}

/// Payload replacing one category label.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CategoryRequest {
    #[validate(length(max = 255))]
    pub label: String,
}

/// Payload authoring one cell.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CellRequest {
    pub question: String,
    pub answer: String,
}

/// One row of the stored-boards listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardListItem {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl From<BoardListItemEntity> for BoardListItem {
    fn from(entity: BoardListItemEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: format_system_time(entity.created_at),
        }
    }
}
