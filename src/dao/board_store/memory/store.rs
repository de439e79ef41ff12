use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    board_store::BoardStore,
    models::{BoardEntity, BoardListItemEntity, ProgressEntity},
    storage::StorageResult,
};

/// In-process store keeping boards and progress in concurrent maps.
///
/// This is the local ephemeral backend: contents vanish with the process.
/// Operations never fail, which also makes it the storage double for
/// service-level tests.
#[derive(Debug, Default)]
pub struct MemoryBoardStore {
    boards: DashMap<i64, BoardEntity>,
    progress: DashMap<i64, ProgressEntity>,
}

impl BoardStore for MemoryBoardStore {
    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<i64>> {
        let id = board.id;
        self.boards.insert(id, board);
        Box::pin(async move { Ok(id) })
    }

    fn find_board(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        let found = self.boards.get(&id).map(|entry| entry.clone());
        Box::pin(async move { Ok(found) })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.progress.insert(progress.board_id, progress);
        Box::pin(async move { Ok(()) })
    }

    fn find_progress(
        &self,
        board_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let found = self.progress.get(&board_id).map(|entry| entry.clone());
        Box::pin(async move { Ok(found) })
    }

    fn reset_progress(&self, board_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        self.progress.remove(&board_id);
        Box::pin(async move { Ok(()) })
    }

    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<BoardListItemEntity>>> {
        let mut items: Vec<BoardListItemEntity> = self
            .boards
            .iter()
            .map(|entry| entry.value().clone().into())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Box::pin(async move { Ok(items) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::state::board::{Board, CellKey, DEFAULT_BOARD_ID};

    fn sample_board() -> BoardEntity {
        Board::new_default()
            .with_cell(CellKey::new(0, 0), "Q".into(), "A".into())
            .into()
    }

    #[tokio::test]
    async fn save_then_find_round_trips_all_fields() {
        let store = MemoryBoardStore::default();
        let entity = sample_board();

        let id = store.save_board(entity.clone()).await.unwrap();
        assert_eq!(id, DEFAULT_BOARD_ID);

        let loaded = store.find_board(id).await.unwrap().unwrap();
        assert_eq!(loaded, entity);
    }

    #[tokio::test]
    async fn find_is_absent_before_any_save() {
        let store = MemoryBoardStore::default();
        assert!(store.find_board(DEFAULT_BOARD_ID).await.unwrap().is_none());
        assert!(
            store
                .find_progress(DEFAULT_BOARD_ID)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn saving_twice_keeps_a_single_record() {
        let store = MemoryBoardStore::default();
        let entity = sample_board();

        store.save_board(entity.clone()).await.unwrap();
        store.save_board(entity.clone()).await.unwrap();

        assert_eq!(store.list_boards().await.unwrap().len(), 1);
        assert_eq!(
            store.find_board(entity.id).await.unwrap().unwrap(),
            entity
        );
    }

    #[tokio::test]
    async fn later_save_wins_on_the_singleton_record() {
        let store = MemoryBoardStore::default();
        let mut session_a = sample_board();
        session_a.name = "Session A".into();
        let mut session_b = sample_board();
        session_b.name = "Session B".into();

        store.save_board(session_a).await.unwrap();
        store.save_board(session_b).await.unwrap();

        let stored = store.find_board(DEFAULT_BOARD_ID).await.unwrap().unwrap();
        assert_eq!(stored.name, "Session B");
    }

    #[tokio::test]
    async fn progress_upserts_into_a_single_record() {
        let store = MemoryBoardStore::default();
        let first = ProgressEntity {
            board_id: DEFAULT_BOARD_ID,
            completed_cells: vec!["0-0".into()],
            updated_at: SystemTime::now(),
        };
        let second = ProgressEntity {
            completed_cells: vec!["0-0".into(), "1-2".into()],
            ..first.clone()
        };

        store.save_progress(first).await.unwrap();
        store.save_progress(second.clone()).await.unwrap();

        let stored = store
            .find_progress(DEFAULT_BOARD_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.completed_cells, second.completed_cells);
    }

    #[tokio::test]
    async fn reset_deletes_the_progress_record() {
        let store = MemoryBoardStore::default();
        store
            .save_progress(ProgressEntity {
                board_id: DEFAULT_BOARD_ID,
                completed_cells: vec!["0-0".into()],
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();

        store.reset_progress(DEFAULT_BOARD_ID).await.unwrap();

        // Absent, not an empty list.
        assert!(
            store
                .find_progress(DEFAULT_BOARD_ID)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let store = MemoryBoardStore::default();
        let older = BoardEntity {
            id: 7,
            created_at: SystemTime::now() - Duration::from_secs(3600),
            ..sample_board()
        };
        store.save_board(older).await.unwrap();
        store.save_board(sample_board()).await.unwrap();

        let ids: Vec<i64> = store
            .list_boards()
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![DEFAULT_BOARD_ID, 7]);
    }
}
