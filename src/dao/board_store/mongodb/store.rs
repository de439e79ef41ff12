use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoBoardDocument, MongoProgressDocument, doc_id},
};
use crate::dao::{
    board_store::BoardStore,
    models::{BoardEntity, BoardListItemEntity, ProgressEntity},
    storage::StorageResult,
};

const BOARD_COLLECTION_NAME: &str = "boards";
const PROGRESS_COLLECTION_NAME: &str = "progress";

/// Durable [`BoardStore`] backed by MongoDB.
#[derive(Clone)]
pub struct MongoBoardStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBoardStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // Progress records need no extra index: their `_id` is the board id.
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(BOARD_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("board_name_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: BOARD_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<MongoBoardDocument> {
        self.database()
            .await
            .collection::<MongoBoardDocument>(BOARD_COLLECTION_NAME)
    }

    async fn progress_collection(&self) -> Collection<MongoProgressDocument> {
        self.database()
            .await
            .collection::<MongoProgressDocument>(PROGRESS_COLLECTION_NAME)
    }

    async fn save_board(&self, board: BoardEntity) -> MongoResult<i64> {
        let id = board.id;
        let document: MongoBoardDocument = board.into();
        let collection = self.collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveBoard { id, source })?;

        Ok(id)
    }

    async fn find_board(&self, id: i64) -> MongoResult<Option<BoardEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadBoard { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn save_progress(&self, progress: ProgressEntity) -> MongoResult<()> {
        let board_id = progress.board_id;
        let document: MongoProgressDocument = progress.into();
        let collection = self.progress_collection().await;
        collection
            .replace_one(doc_id(board_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveProgress { board_id, source })?;

        Ok(())
    }

    async fn find_progress(&self, board_id: i64) -> MongoResult<Option<ProgressEntity>> {
        let collection = self.progress_collection().await;

        let document = collection
            .find_one(doc_id(board_id))
            .await
            .map_err(|source| MongoDaoError::LoadProgress { board_id, source })?;

        Ok(document.map(Into::into))
    }

    async fn reset_progress(&self, board_id: i64) -> MongoResult<()> {
        let collection = self.progress_collection().await;

        collection
            .delete_one(doc_id(board_id))
            .await
            .map_err(|source| MongoDaoError::ResetProgress { board_id, source })?;

        Ok(())
    }

    async fn list_boards(&self) -> MongoResult<Vec<BoardListItemEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoBoardDocument> = collection
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListBoards { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListBoards { source })?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let entity: BoardEntity = document.into();
                entity.into()
            })
            .collect())
    }
}

impl BoardStore for MongoBoardStore {
    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move { store.save_board(board).await.map_err(Into::into) })
    }

    fn find_board(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_board(id).await.map_err(Into::into) })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_progress(progress).await.map_err(Into::into) })
    }

    fn find_progress(
        &self,
        board_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_progress(board_id).await.map_err(Into::into) })
    }

    fn reset_progress(&self, board_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reset_progress(board_id).await.map_err(Into::into) })
    }

    fn list_boards(&self) -> BoxFuture<'static, StorageResult<Vec<BoardListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_boards().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
