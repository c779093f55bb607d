use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{league_store::LeagueStore, storage::StorageError},
    state::SharedState,
};

/// Backoff and polling tunables.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorTimings {
    /// First backoff delay after a failed attempt.
    pub initial_delay: Duration,
    /// Upper bound of the exponential backoff.
    pub max_delay: Duration,
    /// Period between health checks.
    pub health_poll_interval: Duration,
    /// Reconnect attempts before the store is dropped and the backend rebuilt.
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

impl SupervisorTimings {
    fn next_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_delay)
    }
}

/// Connect to the storage backend, then poll its health for the lifetime of
/// the process. While storage is unreachable the shared state stays in
/// degraded mode and every data route answers 503.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn LeagueStore>, StorageError>> + Send,
{
    run_with_timings(state, connect, SupervisorTimings::default()).await
}

/// [`run`] with explicit timings, used by tests.
pub async fn run_with_timings<F, Fut>(state: SharedState, mut connect: F, timings: SupervisorTimings)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn LeagueStore>, StorageError>> + Send,
{
    let mut delay = timings.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_league_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = timings.initial_delay;

                watch_store(&state, store.as_ref(), &timings).await;

                warn!("exhausted storage reconnect attempts; connecting from scratch");
                state.clear_league_store().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = timings.next_delay(delay);
    }
}

/// Poll `store` until it fails and cannot be revived in place.
async fn watch_store(state: &SharedState, store: &dyn LeagueStore, timings: &SupervisorTimings) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);
                if !reconnect(store, timings).await {
                    return;
                }
                info!("storage reconnection succeeded after health check failure");
                state.update_degraded(false);
            }
        }
        sleep(timings.health_poll_interval).await;
    }
}

async fn reconnect(store: &dyn LeagueStore, timings: &SupervisorTimings) -> bool {
    let mut delay = timings.initial_delay;
    for attempt in 0..timings.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = timings.next_delay(delay);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            league_store::memory::MemoryLeagueStore,
            models::{DraftEntity, FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity},
            storage::StorageResult,
        },
        scoresheet::{MatchId, ScorekeeperId},
        state::{AppState, match_lifecycle::MatchStatus},
    };

    fn fast() -> SupervisorTimings {
        SupervisorTimings {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            health_poll_interval: Duration::from_millis(1),
            max_reconnect_attempts: 2,
        }
    }

    /// Healthy store that never manages to reconnect once it went down.
    struct Unreachable {
        inner: MemoryLeagueStore,
        reconnects: AtomicU32,
    }

    fn offline() -> StorageError {
        StorageError::unavailable("offline".into(), std::io::Error::other("offline"))
    }

    impl LeagueStore for Unreachable {
        fn find_match(&self, id: MatchId) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            self.inner.find_match(id)
        }
        fn update_match_status(
            &self,
            id: MatchId,
            status: MatchStatus,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.update_match_status(id, status)
        }
        fn find_draft(
            &self,
            match_id: MatchId,
            scorekeeper_id: ScorekeeperId,
        ) -> BoxFuture<'static, StorageResult<Option<DraftEntity>>> {
            self.inner.find_draft(match_id, scorekeeper_id)
        }
        fn save_draft(&self, draft: DraftEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_draft(draft)
        }
        fn finalize_match(&self, finalized: FinalizedMatch) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.finalize_match(finalized)
        }
        fn reopen_match(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.reopen_match(review)
        }
        fn find_result(
            &self,
            match_id: MatchId,
        ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
            self.inner.find_result(match_id)
        }
        fn list_reviews(&self, match_id: MatchId) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
            self.inner.list_reviews(match_id)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(offline()) })
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(offline()) })
        }
    }

    #[tokio::test]
    async fn gives_up_on_a_dead_store_after_bounded_attempts() {
        let state = AppState::new(AppConfig::default());
        let store = Unreachable {
            inner: MemoryLeagueStore::new(),
            reconnects: AtomicU32::new(0),
        };
        state.set_league_store(Arc::new(MemoryLeagueStore::new())).await;

        watch_store(&state, &store, &fast()).await;

        assert_eq!(store.reconnects.load(Ordering::SeqCst), 2);
        assert!(state.is_degraded());
    }

    #[tokio::test]
    async fn installs_store_once_connected() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();

        let supervisor = tokio::spawn(run_with_timings(
            state.clone(),
            || async { Ok(Arc::new(MemoryLeagueStore::new()) as Arc<dyn LeagueStore>) },
            fast(),
        ));

        watcher.wait_for(|degraded| !degraded).await.unwrap();
        assert!(state.require_league_store().await.is_ok());
        supervisor.abort();
    }
}
