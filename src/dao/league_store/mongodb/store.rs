use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoDraftDocument, MongoMatchDocument, MongoReviewDocument, draft_doc_id, match_filter,
    },
};
use crate::{
    dao::{
        league_store::LeagueStore,
        models::{DraftEntity, FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity},
        storage::StorageResult,
    },
    scoresheet::{AttendanceRecord, EventRecord, MatchId, ScorekeeperId},
    state::match_lifecycle::MatchStatus,
};

const MATCH_COLLECTION_NAME: &str = "matches";
const DRAFT_COLLECTION_NAME: &str = "drafts";
const ATTENDANCE_COLLECTION_NAME: &str = "attendance";
const EVENT_COLLECTION_NAME: &str = "events";
const REVIEW_COLLECTION_NAME: &str = "match_reviews";

/// MongoDB backend. Final sheets are written inside multi-document
/// transactions, which requires a replica set deployment.
#[derive(Clone)]
pub struct MongoLeagueStore {
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

impl MongoLeagueStore {
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
        let database = self.database().await;

        let by_match = [
            (DRAFT_COLLECTION_NAME, "draft_match_idx"),
            (ATTENDANCE_COLLECTION_NAME, "attendance_match_idx"),
            (EVENT_COLLECTION_NAME, "event_match_idx"),
            (REVIEW_COLLECTION_NAME, "review_match_idx"),
        ];

        for (collection, index_name) in by_match {
            let index = IndexModel::builder()
                .keys(doc! {"match_id": 1})
                .options(
                    IndexOptions::builder()
                        .name(Some(index_name.to_owned()))
                        .build(),
                )
                .build();

            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: "match_id",
                    source,
                })?;
        }

        Ok(())
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn match_collection(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn draft_collection(&self) -> Collection<MongoDraftDocument> {
        self.database()
            .await
            .collection::<MongoDraftDocument>(DRAFT_COLLECTION_NAME)
    }

    async fn review_collection(&self) -> Collection<MongoReviewDocument> {
        self.database()
            .await
            .collection::<MongoReviewDocument>(REVIEW_COLLECTION_NAME)
    }

    async fn find_match_document(&self, id: MatchId) -> MongoResult<Option<MongoMatchDocument>> {
        self.match_collection()
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })
    }

    async fn update_match_status(&self, id: MatchId, status: MatchStatus) -> MongoResult<bool> {
        let result = self
            .match_collection()
            .await
            .update_one(
                doc! {"_id": id},
                doc! {"$set": {"status": status.as_str(), "updated_at": DateTime::now()}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateMatch { id, source })?;
        Ok(result.matched_count > 0)
    }

    async fn find_draft(
        &self,
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
    ) -> MongoResult<Option<DraftEntity>> {
        let document = self
            .draft_collection()
            .await
            .find_one(doc! {"_id": draft_doc_id(match_id, scorekeeper_id)})
            .await
            .map_err(|source| MongoDaoError::LoadDraft {
                match_id,
                scorekeeper_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn save_draft(&self, draft: DraftEntity) -> MongoResult<()> {
        let match_id = draft.match_id;
        let scorekeeper_id = draft.scorekeeper_id;
        let document: MongoDraftDocument = draft.into();

        self.draft_collection()
            .await
            .replace_one(doc! {"_id": &document.id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveDraft {
                match_id,
                scorekeeper_id,
                source,
            })?;
        Ok(())
    }

    async fn begin_transaction(&self, match_id: MatchId) -> MongoResult<ClientSession> {
        let client = self.client().await;
        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { match_id, source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { match_id, source })?;
        Ok(session)
    }

    async fn finalize_match(&self, finalized: FinalizedMatch) -> MongoResult<()> {
        let match_id = finalized.result.match_id;
        let database = self.database().await;
        let mut session = self.begin_transaction(match_id).await?;
        let outcome = write_final_sheet(&database, &mut session, finalized).await;
        finish_transaction(match_id, session, outcome).await
    }

    async fn reopen_match(&self, review: ReviewEntity) -> MongoResult<()> {
        let match_id = review.match_id;
        let database = self.database().await;
        let mut session = self.begin_transaction(match_id).await?;
        let outcome = write_reopened_match(&database, &mut session, review).await;
        finish_transaction(match_id, session, outcome).await
    }

    async fn find_result(&self, match_id: MatchId) -> MongoResult<Option<MatchResultEntity>> {
        let Some(finalized_at) = self
            .find_match_document(match_id)
            .await?
            .and_then(|document| document.finalized_at)
        else {
            return Ok(None);
        };

        let database = self.database().await;
        let attendance: Vec<AttendanceRecord> = database
            .collection::<AttendanceRecord>(ATTENDANCE_COLLECTION_NAME)
            .find(match_filter(match_id))
            .await
            .map_err(|source| MongoDaoError::LoadResult { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadResult { match_id, source })?;
        let events: Vec<EventRecord> = database
            .collection::<EventRecord>(EVENT_COLLECTION_NAME)
            .find(match_filter(match_id))
            .await
            .map_err(|source| MongoDaoError::LoadResult { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadResult { match_id, source })?;

        Ok(Some(MatchResultEntity {
            match_id,
            attendance,
            events,
            finalized_at: finalized_at.to_system_time(),
        }))
    }

    async fn list_reviews(&self, match_id: MatchId) -> MongoResult<Vec<ReviewEntity>> {
        let documents: Vec<MongoReviewDocument> = self
            .review_collection()
            .await
            .find(match_filter(match_id))
            .sort(doc! {"reviewed_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListReviews { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListReviews { match_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

/// Commit when every step succeeded, abort otherwise.
async fn finish_transaction(
    match_id: MatchId,
    mut session: ClientSession,
    outcome: MongoResult<()>,
) -> MongoResult<()> {
    match outcome {
        Ok(()) => {
            session
                .commit_transaction()
                .await
                .map_err(|source| MongoDaoError::Transaction { match_id, source })?;
            debug!(match_id, "transaction committed");
            Ok(())
        }
        Err(err) => {
            if let Err(abort_err) = session.abort_transaction().await {
                warn!(match_id, error = %abort_err, "failed to abort transaction");
            }
            Err(err)
        }
    }
}

/// Replace the final rows, close the match and record the approval.
async fn write_final_sheet(
    database: &Database,
    session: &mut ClientSession,
    finalized: FinalizedMatch,
) -> MongoResult<()> {
    let FinalizedMatch { result, review } = finalized;
    let match_id = result.match_id;
    let step_error = |step: &'static str| {
        move |source: mongodb::error::Error| MongoDaoError::TransactionStep {
            match_id,
            step,
            source,
        }
    };

    let attendance = database.collection::<AttendanceRecord>(ATTENDANCE_COLLECTION_NAME);
    attendance
        .delete_many(match_filter(match_id))
        .session(&mut *session)
        .await
        .map_err(step_error("delete final attendance"))?;
    if !result.attendance.is_empty() {
        attendance
            .insert_many(&result.attendance)
            .session(&mut *session)
            .await
            .map_err(step_error("insert final attendance"))?;
    }

    let events = database.collection::<EventRecord>(EVENT_COLLECTION_NAME);
    events
        .delete_many(match_filter(match_id))
        .session(&mut *session)
        .await
        .map_err(step_error("delete final events"))?;
    if !result.events.is_empty() {
        events
            .insert_many(&result.events)
            .session(&mut *session)
            .await
            .map_err(step_error("insert final events"))?;
    }

    let updated = database
        .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
        .update_one(
            doc! {"_id": match_id},
            doc! {"$set": {
                "status": MatchStatus::Finished.as_str(),
                "updated_at": DateTime::now(),
                "finalized_at": DateTime::from_system_time(result.finalized_at),
            }},
        )
        .session(&mut *session)
        .await
        .map_err(step_error("mark match finished"))?;
    if updated.matched_count == 0 {
        return Err(MongoDaoError::MissingMatch { match_id });
    }

    database
        .collection::<MongoReviewDocument>(REVIEW_COLLECTION_NAME)
        .insert_one(MongoReviewDocument::from(review))
        .session(&mut *session)
        .await
        .map_err(step_error("record review"))?;

    Ok(())
}

/// Send the match back to live, reopen both drafts and record the rejection.
async fn write_reopened_match(
    database: &Database,
    session: &mut ClientSession,
    review: ReviewEntity,
) -> MongoResult<()> {
    let match_id = review.match_id;
    let step_error = |step: &'static str| {
        move |source: mongodb::error::Error| MongoDaoError::TransactionStep {
            match_id,
            step,
            source,
        }
    };

    let updated = database
        .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
        .update_one(
            doc! {"_id": match_id},
            doc! {"$set": {"status": MatchStatus::Live.as_str(), "updated_at": DateTime::now()}},
        )
        .session(&mut *session)
        .await
        .map_err(step_error("reopen match"))?;
    if updated.matched_count == 0 {
        return Err(MongoDaoError::MissingMatch { match_id });
    }

    database
        .collection::<MongoDraftDocument>(DRAFT_COLLECTION_NAME)
        .update_many(match_filter(match_id), doc! {"$set": {"submitted": false}})
        .session(&mut *session)
        .await
        .map_err(step_error("reopen drafts"))?;

    database
        .collection::<MongoReviewDocument>(REVIEW_COLLECTION_NAME)
        .insert_one(MongoReviewDocument::from(review))
        .session(&mut *session)
        .await
        .map_err(step_error("record review"))?;

    Ok(())
}

impl LeagueStore for MongoLeagueStore {
    fn find_match(&self, id: MatchId) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store.find_match_document(id).await?;
            Ok(document.map(Into::into))
        })
    }

    fn update_match_status(
        &self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_match_status(id, status)
                .await
                .map_err(Into::into)
        })
    }

    fn find_draft(
        &self,
        match_id: MatchId,
        scorekeeper_id: ScorekeeperId,
    ) -> BoxFuture<'static, StorageResult<Option<DraftEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_draft(match_id, scorekeeper_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_draft(&self, draft: DraftEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_draft(draft).await.map_err(Into::into) })
    }

    fn finalize_match(&self, finalized: FinalizedMatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.finalize_match(finalized).await.map_err(Into::into) })
    }

    fn reopen_match(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reopen_match(review).await.map_err(Into::into) })
    }

    fn find_result(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_result(match_id).await.map_err(Into::into) })
    }

    fn list_reviews(&self, match_id: MatchId) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_reviews(match_id).await.map_err(Into::into) })
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
