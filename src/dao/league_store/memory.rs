//! In-process store used by the test-suite and for local runs without a database.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{DraftEntity, FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity},
        storage::{StorageError, StorageResult},
    },
    scoresheet::{MatchId, ScorekeeperId},
    state::match_lifecycle::MatchStatus,
};

/// Failures of the in-memory backend.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// The match id is unknown.
    #[error("match `{0}` does not exist")]
    MissingMatch(MatchId),
}

/// DashMap-backed [`LeagueStore`] keeping everything in memory.
#[derive(Clone, Default)]
pub struct MemoryLeagueStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    matches: DashMap<MatchId, MatchEntity>,
    drafts: DashMap<(MatchId, ScorekeeperId), DraftEntity>,
    results: DashMap<MatchId, MatchResultEntity>,
    reviews: DashMap<MatchId, Vec<ReviewEntity>>,
    /// Serializes multi-table writes so they land together.
    write_gate: Mutex<()>,
}

impl MemoryLeagueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a match row, replacing any previous one with the same id.
    pub fn insert_match(&self, entity: MatchEntity) {
        self.inner.matches.insert(entity.id, entity);
    }
}

impl LeagueStore for MemoryLeagueStore {
    fn find_match(&self, id: MatchId) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.matches.get(&id).map(|entry| entry.value().clone())) })
    }

    fn update_match_status(
        &self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let _gate = store.inner.write_gate.lock().await;
            let Some(mut entity) = store.inner.matches.get_mut(&id) else {
                return Ok(false);
            };
            entity.status = status;
            entity.updated_at = SystemTime::now();
            Ok(true)
        })
    }

    fn find_draft(
        &self,
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
    ) -> BoxFuture<'static, StorageResult<Option<DraftEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .drafts
                .get(&(match_id, scorekeeper_id))
                .map(|entry| entry.value().clone()))
        })
    }

    fn save_draft(&self, draft: DraftEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .drafts
                .insert((draft.match_id, draft.scorekeeper_id), draft);
            Ok(())
        })
    }

    fn finalize_match(&self, finalized: FinalizedMatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _gate = store.inner.write_gate.lock().await;
            let match_id = finalized.result.match_id;

            // Check before writing anything so a missing match leaves no trace.
            let Some(mut entity) = store.inner.matches.get_mut(&match_id) else {
                return Err(StorageError::aborted(
                    "cannot finalize match".into(),
                    MemoryStoreError::MissingMatch(match_id),
                ));
            };

            store.inner.results.insert(match_id, finalized.result);
            entity.status = MatchStatus::Finished;
            entity.updated_at = SystemTime::now();
            drop(entity);
            store
                .inner
                .reviews
                .entry(match_id)
                .or_default()
                .push(finalized.review);
            Ok(())
        })
    }

    fn reopen_match(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _gate = store.inner.write_gate.lock().await;
            let match_id = review.match_id;

            let Some(mut entity) = store.inner.matches.get_mut(&match_id) else {
                return Err(StorageError::aborted(
                    "cannot reopen match".into(),
                    MemoryStoreError::MissingMatch(match_id),
                ));
            };
            entity.status = MatchStatus::Live;
            entity.updated_at = SystemTime::now();
            drop(entity);

            store
                .inner
                .drafts
                .iter_mut()
                .filter(|draft| draft.key().0 == match_id)
                .for_each(|mut draft| draft.submitted = false);
            store
                .inner
                .reviews
                .entry(match_id)
                .or_default()
                .push(review);
            Ok(())
        })
    }

    fn find_result(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .results
                .get(&match_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_reviews(&self, match_id: MatchId) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .reviews
                .get(&match_id)
                .map(|entry| entry.value().clone())
                .unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
