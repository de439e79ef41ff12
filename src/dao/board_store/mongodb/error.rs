//! Error types shared by the MongoDB storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Client construction from parsed options failed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        #[source]
        source: mongodb::error::Error,
    },
    /// Initial connectivity probe kept failing.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        attempts: u32,
        #[source]
        source: mongodb::error::Error,
    },
    /// Index creation at connect time failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    /// Board upsert failed.
    #[error("failed to save board `{id}`")]
    SaveBoard {
        id: i64,
        #[source]
        source: mongodb::error::Error,
    },
    /// Board lookup failed.
    #[error("failed to load board `{id}`")]
    LoadBoard {
        id: i64,
        #[source]
        source: mongodb::error::Error,
    },
    /// Progress upsert failed.
    #[error("failed to save progress for board `{board_id}`")]
    SaveProgress {
        board_id: i64,
        #[source]
        source: mongodb::error::Error,
    },
    /// Progress lookup failed.
    #[error("failed to load progress for board `{board_id}`")]
    LoadProgress {
        board_id: i64,
        #[source]
        source: mongodb::error::Error,
    },
    /// Progress deletion failed.
    #[error("failed to reset progress for board `{board_id}`")]
    ResetProgress {
        board_id: i64,
        #[source]
        source: mongodb::error::Error,
    },
    /// Board listing failed.
    #[error("failed to list boards")]
    ListBoards {
        #[source]
        source: mongodb::error::Error,
    },
    /// Health-check ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        #[source]
        source: mongodb::error::Error,
    },
}
