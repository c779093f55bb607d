use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::scoresheet::{MatchId, ScorekeeperId};

/// Result alias for MongoDB backend operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string does not parse.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// The driver refused the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// The server never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// The URI sets `retryWrites=false`.
    #[error("MongoDB URI disables retryable writes, which match sheet transactions need")]
    RetryWritesDisabled,
    /// The deployment cannot run multi-document transactions.
    #[error("MongoDB deployment is a standalone server; match sheets need a replica set")]
    TransactionsUnsupported,
    /// A periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// Creating an index failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// Reading a match failed.
    #[error("failed to load match `{id}`")]
    LoadMatch {
        id: MatchId,
        #[source]
        source: MongoError,
    },
    /// Writing a match failed.
    #[error("failed to update match `{id}`")]
    UpdateMatch {
        id: MatchId,
        #[source]
        source: MongoError,
    },
    /// Reading a draft failed.
    #[error("failed to load draft of scorekeeper `{scorekeeper_id}` for match `{match_id}`")]
    LoadDraft {
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
        #[source]
        source: MongoError,
    },
    /// Writing a draft failed.
    #[error("failed to save draft of scorekeeper `{scorekeeper_id}` for match `{match_id}`")]
    SaveDraft {
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
        #[source]
        source: MongoError,
    },
    /// Reading a final sheet failed.
    #[error("failed to load final sheet of match `{match_id}`")]
    LoadResult {
        match_id: MatchId,
        #[source]
        source: MongoError,
    },
    /// Reading the audit trail failed.
    #[error("failed to list reviews of match `{match_id}`")]
    ListReviews {
        match_id: MatchId,
        #[source]
        source: MongoError,
    },
    /// Starting or committing a transaction failed.
    #[error("transaction on match `{match_id}` failed")]
    Transaction {
        match_id: MatchId,
        #[source]
        source: MongoError,
    },
    /// A write inside a transaction failed and the transaction was aborted.
    #[error("transaction on match `{match_id}` failed while trying to {step}")]
    TransactionStep {
        match_id: MatchId,
        step: &'static str,
        #[source]
        source: MongoError,
    },
    /// The match vanished before the transaction could update it.
    #[error("match `{match_id}` disappeared during the transaction")]
    MissingMatch { match_id: MatchId },
}

impl MongoDaoError {
    /// Whether the error happened inside a transaction that was rolled back.
    pub fn is_aborted_write(&self) -> bool {
        matches!(
            self,
            MongoDaoError::Transaction { .. }
                | MongoDaoError::TransactionStep { .. }
                | MongoDaoError::MissingMatch { .. }
        )
    }
}
