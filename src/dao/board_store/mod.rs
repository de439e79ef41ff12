/// Always-available in-process store, used as the local ephemeral backend
/// and as the test double.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// Durable MongoDB-backed store.
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{BoardEntity, BoardListItemEntity, ProgressEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for the trivia board and its
/// play-progress sidecar record.
///
/// Every write commits on its own; there is no transaction spanning a board
/// save and a progress save. Absent records surface as `Ok(None)`, never as
/// errors, so callers can tell "no data yet" apart from a backend failure.
pub trait BoardStore: Send + Sync {
    /// Upsert the full board record by identity and return the stored id.
    /// Calling twice with identical input leaves storage unchanged.
    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<i64>>;
    /// Point lookup of a board by identity.
    fn find_board(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>>;
    /// Upsert the completed-cell list for a board. At most one progress
    /// record per board id may ever exist.
    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Point lookup of the progress record for a board.
    fn find_progress(&self, board_id: i64)
    -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>>;
    /// Delete the progress record entirely; a subsequent
    /// [`BoardStore::find_progress`] returns `None`.
    fn reset_progress(&self, board_id: i64) -> BoxFuture<'static, StorageResult<()>>;
    /// All stored boards, newest-created first.
    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<BoardListItemEntity>>>;
    /// Probe the backend for connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
