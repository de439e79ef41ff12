use std::{fmt, str::FromStr, time::SystemTime};

use indexmap::IndexMap;
use thiserror::Error;

use crate::dao::models::{BoardEntity, CellEntity, ProgressEntity};

/// Fixed identity of the single board a deployment owns.
pub const DEFAULT_BOARD_ID: i64 = 1;
/// Name given to a board materialized from defaults, and applied as a
/// fallback whenever a stored record carries an empty name.
pub const DEFAULT_BOARD_NAME: &str = "My Trivia Game";
/// Rows and columns of a freshly created board.
pub const DEFAULT_GRID_EXTENT: u32 = 5;
/// Smallest accepted grid extent; out-of-range edits clamp to it.
pub const MIN_GRID_EXTENT: u32 = 1;
/// Largest accepted grid extent; out-of-range edits clamp to it.
pub const MAX_GRID_EXTENT: u32 = 10;

const POINTS_PER_ROW: u32 = 100;

/// Structured grid coordinate. The `"{row}-{col}"` string form exists only
/// at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Zero-based row index.
    pub row: u32,
    /// Zero-based column index.
    pub col: u32,
}

impl CellKey {
    /// Build a key from zero-based coordinates.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// Error raised when a stored cell key cannot be parsed back into
/// coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed cell key `{key}`: expected `{{row}}-{{col}}`")]
pub struct ParseCellKeyError {
    /// The offending stored key.
    pub key: String,
}

impl FromStr for CellKey {
    type Err = ParseCellKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseCellKeyError {
            key: value.to_owned(),
        };
        let (row, col) = value.split_once('-').ok_or_else(malformed)?;
        Ok(Self {
            row: row.parse().map_err(|_| malformed())?,
            col: col.parse().map_err(|_| malformed())?,
        })
    }
}

/// One authored grid entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Question text shown when the cell is opened.
    pub question: String,
    /// Answer revealed during play.
    pub answer: String,
    /// Whether the cell has been completed in play mode.
    pub played: bool,
}

/// Completed-cell keys reconciled from a stored progress record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Keys of every completed cell.
    pub completed: Vec<CellKey>,
}

/// Authoritative in-memory board: dimensions, category labels, and the
/// authored cells. Mutation operations consume `self` and return a new
/// value, so no caller ever observes a half-applied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Stable identity of the board record.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Number of question rows.
    pub rows: u32,
    /// Number of category columns. `categories.len()` tracks this value.
    pub columns: u32,
    /// Ordered category labels, one per column.
    pub categories: Vec<String>,
    /// Authored cells. Coordinates without an entry are simply not yet
    /// authored.
    pub cells: IndexMap<CellKey, Cell>,
    /// Creation timestamp, set once when the board is materialized.
    pub created_at: SystemTime,
    /// Refreshed whenever the board is saved.
    pub updated_at: SystemTime,
}

impl Board {
    /// Materialize the default board: 5x5, placeholder categories, no cells.
    pub fn new_default() -> Self {
        let now = SystemTime::now();
        Self {
            id: DEFAULT_BOARD_ID,
            name: DEFAULT_BOARD_NAME.to_owned(),
            rows: DEFAULT_GRID_EXTENT,
            columns: DEFAULT_GRID_EXTENT,
            categories: (0..DEFAULT_GRID_EXTENT as usize)
                .map(default_category)
                .collect(),
            cells: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Point value of any cell in `row`. Derived, never stored.
    pub fn points(row: u32) -> u32 {
        (row + 1) * POINTS_PER_ROW
    }

    /// Clamp a requested grid extent into the accepted range.
    pub fn clamp_extent(value: u32) -> u32 {
        value.clamp(MIN_GRID_EXTENT, MAX_GRID_EXTENT)
    }

    /// Look up an authored cell.
    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    /// Replace the display name.
    pub fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// Set the row count, clamped to the accepted range. Cells outside the
    /// new extent are kept; they are just no longer addressable by the grid.
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Self::clamp_extent(rows);
        self
    }

    /// Set the column count, clamped to the accepted range. The category
    /// sequence is resized to match: existing labels are preserved by index
    /// and new slots are padded with placeholder labels.
    pub fn with_columns(mut self, columns: u32) -> Self {
        let columns = Self::clamp_extent(columns);
        let categories = (0..columns as usize)
            .map(|index| {
                self.categories
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| default_category(index))
            })
            .collect();
        self.categories = categories;
        self.columns = columns;
        self
    }

    /// Replace one category label. Out-of-range indices leave the board
    /// unchanged; the service layer rejects them before getting here.
    pub fn with_category(mut self, index: usize, label: String) -> Self {
        if let Some(slot) = self.categories.get_mut(index) {
            *slot = label;
        }
        self
    }

    /// Upsert the cell at `key`. Editing always clears the completion flag,
    /// even when the cell had already been played.
    pub fn with_cell(mut self, key: CellKey, question: String, answer: String) -> Self {
        self.cells.insert(
            key,
            Cell {
                question,
                answer,
                played: false,
            },
        );
        self
    }

    /// Mark the cell at `key` completed. Unauthored coordinates are a no-op.
    pub fn with_played(mut self, key: CellKey) -> Self {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.played = true;
        }
        self
    }

    /// Clear the completion flag on every authored cell.
    pub fn cleared(mut self) -> Self {
        for cell in self.cells.values_mut() {
            cell.played = false;
        }
        self
    }

    /// Merge a stored progress record into the in-memory flags: every listed
    /// key that exists becomes played, keys for unauthored coordinates are
    /// ignored, and cells absent from the list are left as-is so a
    /// previously played cell is never un-played by the merge.
    pub fn apply_progress(mut self, progress: &Progress) -> Self {
        for key in &progress.completed {
            if let Some(cell) = self.cells.get_mut(key) {
                cell.played = true;
            }
        }
        self
    }

    /// Keys of every completed cell, in authoring order.
    pub fn completed_cells(&self) -> Vec<CellKey> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.played)
            .map(|(key, _)| *key)
            .collect()
    }
}

fn default_category(index: usize) -> String {
    format!("Category {}", index + 1)
}

impl From<Board> for BoardEntity {
    fn from(board: Board) -> Self {
        Self {
            id: board.id,
            name: board.name,
            rows: board.rows,
            columns: board.columns,
            categories: board.categories,
            cells: board
                .cells
                .into_iter()
                .map(|(key, cell)| (key.to_string(), cell.into()))
                .collect(),
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

impl TryFrom<BoardEntity> for Board {
    type Error = ParseCellKeyError;

    fn try_from(entity: BoardEntity) -> Result<Self, Self::Error> {
        let cells = entity
            .cells
            .into_iter()
            .map(|(key, cell)| Ok((key.parse()?, cell.into())))
            .collect::<Result<IndexMap<CellKey, Cell>, ParseCellKeyError>>()?;

        // Canonical default-name behavior: the fallback applies on load for
        // every backend, not just some of them.
        let name = if entity.name.trim().is_empty() {
            DEFAULT_BOARD_NAME.to_owned()
        } else {
            entity.name
        };

        Ok(Self {
            id: entity.id,
            name,
            rows: entity.rows,
            columns: entity.columns,
            categories: entity.categories,
            cells,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<Cell> for CellEntity {
    fn from(cell: Cell) -> Self {
        Self {
            question: cell.question,
            answer: cell.answer,
            played: cell.played,
        }
    }
}

impl From<CellEntity> for Cell {
    fn from(entity: CellEntity) -> Self {
        Self {
            question: entity.question,
            answer: entity.answer,
            played: entity.played,
        }
    }
}

impl From<&Board> for ProgressEntity {
    fn from(board: &Board) -> Self {
        Self {
            board_id: board.id,
            completed_cells: board
                .completed_cells()
                .iter()
                .map(CellKey::to_string)
                .collect(),
            updated_at: SystemTime::now(),
        }
    }
}

impl TryFrom<ProgressEntity> for Progress {
    type Error = ParseCellKeyError;

    fn try_from(entity: ProgressEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            completed: entity
                .completed_cells
                .iter()
                .map(|key| key.parse())
                .collect::<Result<Vec<CellKey>, ParseCellKeyError>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_depend_only_on_row() {
        assert_eq!(Board::points(0), 100);
        assert_eq!(Board::points(1), 200);
        assert_eq!(Board::points(4), 500);
        assert_eq!(Board::points(9), 1000);
    }

    #[test]
    fn cell_key_round_trips_through_storage_form() {
        let key = CellKey::new(3, 7);
        assert_eq!(key.to_string(), "3-7");
        assert_eq!("3-7".parse::<CellKey>().unwrap(), key);
    }

    #[test]
    fn cell_key_rejects_malformed_input() {
        for bad in ["", "3", "3-", "-7", "a-b", "3-7-1", "3_7"] {
            assert!(bad.parse::<CellKey>().is_err(), "accepted `{bad}`");
        }
    }

    #[test]
    fn shrinking_columns_truncates_categories() {
        let board = Board::new_default().with_columns(3);
        assert_eq!(board.columns, 3);
        assert_eq!(
            board.categories,
            vec!["Category 1", "Category 2", "Category 3"]
        );
    }

    #[test]
    fn growing_columns_preserves_existing_labels_and_pads() {
        let board = Board::new_default()
            .with_category(0, "History".into())
            .with_columns(2)
            .with_columns(4);
        assert_eq!(
            board.categories,
            vec!["History", "Category 2", "Category 3", "Category 4"]
        );
    }

    #[test]
    fn extents_clamp_to_accepted_range() {
        let board = Board::new_default().with_rows(0).with_columns(99);
        assert_eq!(board.rows, MIN_GRID_EXTENT);
        assert_eq!(board.columns, MAX_GRID_EXTENT);
        assert_eq!(board.categories.len(), MAX_GRID_EXTENT as usize);
    }

    #[test]
    fn editing_a_cell_resets_its_completion_flag() {
        let key = CellKey::new(0, 0);
        let board = Board::new_default()
            .with_cell(key, "Q".into(), "A".into())
            .with_played(key)
            .with_cell(key, "Q2".into(), "A".into());
        assert!(!board.cell(key).unwrap().played);
        assert_eq!(board.cell(key).unwrap().question, "Q2");
    }

    #[test]
    fn marking_an_unauthored_cell_is_a_no_op() {
        let board = Board::new_default().with_played(CellKey::new(2, 2));
        assert!(board.cells.is_empty());
    }

    #[test]
    fn progress_merge_never_unplays_cells() {
        let stale = CellKey::new(0, 0);
        let fresh = CellKey::new(1, 1);
        let board = Board::new_default()
            .with_cell(stale, "Q".into(), "A".into())
            .with_cell(fresh, "Q".into(), "A".into())
            .with_played(stale)
            .apply_progress(&Progress {
                completed: vec![fresh, CellKey::new(9, 9)],
            });
        assert!(board.cell(stale).unwrap().played);
        assert!(board.cell(fresh).unwrap().played);
    }

    #[test]
    fn completed_cells_filters_played_flags() {
        let a = CellKey::new(0, 0);
        let b = CellKey::new(1, 0);
        let board = Board::new_default()
            .with_cell(a, "Q".into(), "A".into())
            .with_cell(b, "Q".into(), "A".into())
            .with_played(b);
        assert_eq!(board.completed_cells(), vec![b]);
    }

    #[test]
    fn empty_stored_name_falls_back_to_default_on_load() {
        let mut entity: BoardEntity = Board::new_default().into();
        entity.name = "  ".into();
        let board = Board::try_from(entity).unwrap();
        assert_eq!(board.name, DEFAULT_BOARD_NAME);
    }

    #[test]
    fn board_survives_entity_round_trip() {
        let board = Board::new_default()
            .with_cell(CellKey::new(0, 0), "Q".into(), "A".into())
            .with_played(CellKey::new(0, 0));
        let entity: BoardEntity = board.clone().into();
        assert!(entity.cells.contains_key("0-0"));
        assert_eq!(Board::try_from(entity).unwrap(), board);
    }

    #[test]
    fn malformed_stored_cell_key_fails_the_conversion() {
        let mut entity: BoardEntity = Board::new_default().into();
        entity.cells.insert(
            "not-a-key".into(),
            CellEntity {
                question: String::new(),
                answer: String::new(),
                played: false,
            },
        );
        assert!(Board::try_from(entity).is_err());
    }
}
