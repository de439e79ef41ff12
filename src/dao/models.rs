use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Single grid entry persisted inside the board record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellEntity {
    /// Question text shown when the cell is opened.
    pub question: String,
    /// Answer revealed during play.
    pub answer: String,
    /// Whether the cell has already been completed.
    pub played: bool,
}

/// Aggregate board entity persisted by the storage layer.
///
/// Cell keys are stored in their `"{row}-{col}"` string form; the runtime
/// model parses them back into structured coordinates on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntity {
    /// Primary key of the board. A single deployment owns exactly one
    /// board, stored under the fixed default identity.
    pub id: i64,
    /// Display name of the trivia board.
    pub name: String,
    /// Number of question rows.
    pub rows: u32,
    /// Number of category columns.
    pub columns: u32,
    /// Ordered category labels, one per column.
    pub categories: Vec<String>,
    /// Authored cells keyed by their serialized coordinate.
    pub cells: IndexMap<String, CellEntity>,
    /// Creation timestamp for auditing/listing.
    pub created_at: SystemTime,
    /// Last time the board entity was saved.
    pub updated_at: SystemTime,
}

/// Play-progress sidecar record, at most one per board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Board the progress belongs to; doubles as the record identity so a
    /// second record for the same board cannot exist.
    pub board_id: i64,
    /// Serialized keys of every completed cell.
    pub completed_cells: Vec<String>,
    /// Last time the progress record was written.
    pub updated_at: SystemTime,
}

/// Listing projection of a board (subset of [`BoardEntity`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardListItemEntity {
    /// Primary key of the board.
    pub id: i64,
    /// Display name of the trivia board.
    pub name: String,
    /// Creation timestamp used for newest-first ordering.
    pub created_at: SystemTime,
}

impl From<BoardEntity> for BoardListItemEntity {
    fn from(entity: BoardEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: entity.created_at,
        }
    }
}
