/// CouchDB backend, one document per match, draft and review.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend for tests and local runs.
pub mod memory;
/// MongoDB backend using multi-document transactions.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{DraftEntity, FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity};
use crate::dao::storage::StorageResult;
use crate::scoresheet::{MatchId, ScorekeeperId};
use crate::state::match_lifecycle::MatchStatus;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for matches, scorekeeper drafts and
/// final match sheets.
pub trait LeagueStore: Send + Sync {
    /// Load a match by id.
    fn find_match(&self, id: MatchId) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Overwrite the status of a match, returning false when the match does not exist.
    fn update_match_status(
        &self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Load the draft a scorekeeper keeps for a match.
    fn find_draft(
        &self,
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
    ) -> BoxFuture<'static, StorageResult<Option<DraftEntity>>>;
    /// Upsert a draft; drafts are never merged at write time.
    fn save_draft(&self, draft: DraftEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically replace the final sheet, mark the match finished and store
    /// the audit record. Either every write lands or none does.
    fn finalize_match(&self, finalized: FinalizedMatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically send a match back to live, reopen its drafts and store the
    /// audit record.
    fn reopen_match(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Final sheet of a match, present once it has been approved.
    fn find_result(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>>;
    /// Audit records of a match, oldest first.
    fn list_reviews(&self, match_id: MatchId) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>>;
    /// Cheap round trip proving the backend still answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
