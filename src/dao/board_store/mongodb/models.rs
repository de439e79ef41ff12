use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{BoardEntity, CellEntity, ProgressEntity};

/// Board record as stored in the `boards` collection. The document `_id` is
/// the board id itself, so the upsert target is unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBoardDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    rows: u32,
    columns: u32,
    categories: Vec<String>,
    cells: IndexMap<String, CellEntity>,
    created_at: DateTime,
    updated_at: DateTime,
}

/// Progress record as stored in the `progress` collection. Using the board
/// id as `_id` makes a duplicate progress row for the same board impossible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProgressDocument {
    #[serde(rename = "_id")]
    board_id: i64,
    completed_cells: Vec<String>,
    updated_at: DateTime,
}

impl From<BoardEntity> for MongoBoardDocument {
    fn from(value: BoardEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rows: value.rows,
            columns: value.columns,
            categories: value.categories,
            cells: value.cells,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoBoardDocument> for BoardEntity {
    fn from(value: MongoBoardDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rows: value.rows,
            columns: value.columns,
            categories: value.categories,
            cells: value.cells,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

impl From<ProgressEntity> for MongoProgressDocument {
    fn from(value: ProgressEntity) -> Self {
        Self {
            board_id: value.board_id,
            completed_cells: value.completed_cells,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoProgressDocument> for ProgressEntity {
    fn from(value: MongoProgressDocument) -> Self {
        Self {
            board_id: value.board_id,
            completed_cells: value.completed_cells,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn doc_id(id: i64) -> Document {
    doc! {"_id": id}
}
