use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::{debug, warn};

use crate::{
    dao::{
        league_store::LeagueStore,
        models::{DraftEntity, FinalizedMatch, MatchEntity, MatchResultEntity, ReviewEntity},
        storage::StorageResult,
    },
    scoresheet::{MatchId, ScorekeeperId},
    state::match_lifecycle::MatchStatus,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchDraftDocument, CouchMatchDocument, CouchReviewDocument, END_SUFFIX,
        FinalSheetBody, WriteResponse, draft_doc_id, draft_prefix, match_doc_id, review_prefix,
    },
};

/// CouchDB backend. Without multi-document transactions, multi-step writes
/// undo what they already wrote when a later step fails.
#[derive(Clone)]
pub struct CouchLeagueStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchLeagueStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url);
        let database = Arc::<str>::from(config.database);
        let auth = config.credentials.map(|credentials| {
            (
                Arc::<str>::from(credentials.username),
                Arc::<str>::from(credentials.password),
            )
        });

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.with_auth(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    debug!(database = %database, "created CouchDB database");
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Write a document and return its new revision.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            });
        }

        let written = response.json::<WriteResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: doc_id.to_string(),
                source,
            }
        })?;
        Ok(written.rev)
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| (row.id, doc)))
            .map(|(id, doc)| {
                from_value(doc).map_err(|source| CouchDaoError::DeserializeValue { path: id, source })
            })
            .collect()
    }

    async fn load_match(&self, match_id: MatchId) -> CouchResult<CouchMatchDocument> {
        self.get_document::<CouchMatchDocument>(&match_doc_id(match_id))
            .await?
            .ok_or(CouchDaoError::MissingMatch { match_id })
    }

    /// Write the audit document, returning its id and revision for cleanup.
    async fn put_review(&self, review: ReviewEntity) -> CouchResult<(String, String)> {
        let document = CouchReviewDocument::from(review);
        let rev = self.put_document(&document.id, &document).await?;
        Ok((document.id, rev))
    }

    /// Remove an audit document after a later step failed, wrapping the
    /// original failure.
    async fn undo_review(
        &self,
        match_id: MatchId,
        step: &'static str,
        review: (String, String),
        cause: CouchDaoError,
    ) -> CouchDaoError {
        let (doc_id, rev) = review;
        if let Err(err) = self.delete_document(&doc_id, &rev).await {
            warn!(match_id, doc_id = %doc_id, error = %err, "failed to remove orphan review document");
            return cause;
        }
        CouchDaoError::Compensated {
            match_id,
            step,
            source: Box::new(cause),
        }
    }

    async fn finalize_match(&self, finalized: FinalizedMatch) -> CouchResult<()> {
        let FinalizedMatch { result, review } = finalized;
        let match_id = result.match_id;
        let mut document = self.load_match(match_id).await?;

        let written_review = self.put_review(review).await?;

        document.body.status = MatchStatus::Finished;
        document.body.updated_at = SystemTime::now();
        document.body.result = Some(FinalSheetBody {
            attendance: result.attendance,
            events: result.events,
            finalized_at: result.finalized_at,
        });
        if let Err(err) = self.put_document(&document.id, &document).await {
            return Err(self
                .undo_review(match_id, "write final sheet", written_review, err)
                .await);
        }
        Ok(())
    }

    async fn reopen_match(&self, review: ReviewEntity) -> CouchResult<()> {
        let match_id = review.match_id;
        let mut document = self.load_match(match_id).await?;
        let previous = document.clone();

        let written_review = self.put_review(review).await?;

        document.body.status = MatchStatus::Live;
        document.body.updated_at = SystemTime::now();
        let match_rev = match self.put_document(&document.id, &document).await {
            Ok(rev) => rev,
            Err(err) => {
                return Err(self
                    .undo_review(match_id, "reopen match", written_review, err)
                    .await);
            }
        };

        if let Err(err) = self.reopen_drafts(match_id).await {
            let mut restored = previous;
            restored.rev = Some(match_rev);
            if let Err(restore_err) = self.put_document(&restored.id, &restored).await {
                warn!(match_id, error = %restore_err, "failed to restore match status");
            }
            return Err(self
                .undo_review(match_id, "reopen drafts", written_review, err)
                .await);
        }
        Ok(())
    }

    /// Clear the submitted flag of every draft of a match. When one write
    /// fails, the drafts already reopened are submitted again before the
    /// error is returned.
    async fn reopen_drafts(&self, match_id: MatchId) -> CouchResult<()> {
        let drafts = self
            .list_documents::<CouchDraftDocument>(&draft_prefix(match_id))
            .await?;

        let mut reopened = Vec::new();
        for mut document in drafts.into_iter().filter(|doc| doc.draft.submitted) {
            document.draft.submitted = false;
            match self.put_document(&document.id, &document).await {
                Ok(rev) => {
                    document.rev = Some(rev);
                    document.draft.submitted = true;
                    reopened.push(document);
                }
                Err(err) => {
                    self.resubmit_drafts(match_id, reopened).await;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn resubmit_drafts(&self, match_id: MatchId, drafts: Vec<CouchDraftDocument>) {
        for document in drafts {
            if let Err(err) = self.put_document(&document.id, &document).await {
                warn!(match_id, doc_id = %document.id, error = %err, "failed to resubmit reopened draft");
            }
        }
    }

    async fn save_draft(&self, draft: DraftEntity) -> CouchResult<()> {
        let doc_id = draft_doc_id(draft.match_id, draft.scorekeeper_id);
        let rev = self
            .get_document::<CouchDraftDocument>(&doc_id)
            .await?
            .and_then(|existing| existing.rev);
        let document = CouchDraftDocument::from((draft, rev));
        self.put_document(&doc_id, &document).await.map(|_| ())
    }

    async fn update_match_status(&self, id: MatchId, status: MatchStatus) -> CouchResult<bool> {
        let Some(mut document) = self
            .get_document::<CouchMatchDocument>(&match_doc_id(id))
            .await?
        else {
            return Ok(false);
        };
        document.body.status = status;
        document.body.updated_at = SystemTime::now();
        self.put_document(&document.id, &document).await?;
        Ok(true)
    }
}

impl LeagueStore for CouchLeagueStore {
    fn find_match(&self, id: MatchId) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchMatchDocument>(&match_doc_id(id))
                .await?;
            Ok(maybe_doc.map(CouchMatchDocument::into_entity))
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
            let doc_id = draft_doc_id(match_id, scorekeeper_id);
            let maybe_doc = store.get_document::<CouchDraftDocument>(&doc_id).await?;
            Ok(maybe_doc.map(|doc| doc.draft))
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
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchMatchDocument>(&match_doc_id(match_id))
                .await?;
            Ok(maybe_doc.and_then(|doc| doc.result_entity()))
        })
    }

    fn list_reviews(&self, match_id: MatchId) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchReviewDocument>(&review_prefix(match_id))
                .await?;
            let mut reviews: Vec<ReviewEntity> = docs.into_iter().map(|doc| doc.review).collect();
            reviews.sort_by_key(|review| review.reviewed_at);
            Ok(reviews)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .with_auth(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeMap, HashMap, HashSet},
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode as HttpStatus,
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use uuid::Uuid;

    use super::*;
    use crate::dao::{league_store::couchdb::models::MatchBody, models::ReviewOutcome};

    /// Just enough of CouchDB to run document writes: revisions, `_all_docs`
    /// range reads, and PUTs forced to fail for chosen document ids.
    #[derive(Default)]
    struct FakeCouch {
        docs: BTreeMap<String, Value>,
        next_rev: u64,
        failing_puts: HashSet<String>,
    }

    type Shared = Arc<Mutex<FakeCouch>>;

    async fn database_info() -> Json<Value> {
        Json(json!({ "db_name": "planilla" }))
    }

    async fn get_doc(
        State(couch): State<Shared>,
        Path((_db, doc_id)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Response {
        let couch = couch.lock().unwrap();
        if doc_id == "_all_docs" {
            let bound = |key: &str| {
                serde_json::from_str::<String>(&query[key]).unwrap()
            };
            let (start, end) = (bound("startkey"), bound("endkey"));
            let rows: Vec<Value> = couch
                .docs
                .iter()
                .filter(|(id, _)| id.as_str() >= start.as_str() && id.as_str() <= end.as_str())
                .map(|(id, doc)| json!({ "id": id, "doc": doc }))
                .collect();
            return Json(json!({ "rows": rows })).into_response();
        }
        match couch.docs.get(&doc_id) {
            Some(doc) => Json(doc.clone()).into_response(),
            None => (HttpStatus::NOT_FOUND, Json(json!({ "error": "not_found" }))).into_response(),
        }
    }

    async fn put_doc(
        State(couch): State<Shared>,
        Path((_db, doc_id)): Path<(String, String)>,
        Json(mut body): Json<Value>,
    ) -> Response {
        let mut couch = couch.lock().unwrap();
        if couch.failing_puts.contains(&doc_id) {
            return (HttpStatus::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" })))
                .into_response();
        }
        let stored_rev = couch.docs.get(&doc_id).and_then(|doc| doc.get("_rev").cloned());
        if stored_rev != body.get("_rev").cloned() {
            return (HttpStatus::CONFLICT, Json(json!({ "error": "conflict" }))).into_response();
        }
        couch.next_rev += 1;
        let rev = format!("{}-fake", couch.next_rev);
        body["_rev"] = json!(rev);
        couch.docs.insert(doc_id.clone(), body);
        (HttpStatus::CREATED, Json(json!({ "ok": true, "id": doc_id, "rev": rev }))).into_response()
    }

    async fn delete_doc(
        State(couch): State<Shared>,
        Path((_db, doc_id)): Path<(String, String)>,
    ) -> Json<Value> {
        couch.lock().unwrap().docs.remove(&doc_id);
        Json(json!({ "ok": true, "id": doc_id, "rev": "deleted" }))
    }

    async fn fake_store() -> (CouchLeagueStore, Shared) {
        let couch = Shared::default();
        let app = Router::new()
            .route("/{db}", get(database_info))
            .route("/{db}/{doc}", get(get_doc).put(put_doc).delete(delete_doc))
            .with_state(couch.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake couch");
        let addr = listener.local_addr().expect("fake couch addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake couch");
        });

        let config = CouchConfig::new(format!("http://{addr}"), "planilla").unwrap();
        let store = CouchLeagueStore::connect(config).await.expect("connect fake couch");
        (store, couch)
    }

    async fn seed_match_in_review(store: &CouchLeagueStore) {
        let document = CouchMatchDocument {
            id: match_doc_id(1),
            rev: None,
            body: MatchBody {
                match_id: 1,
                home_team_id: 10,
                away_team_id: 20,
                status: MatchStatus::AdminReview,
                scorekeepers: vec![100, 200],
                updated_at: SystemTime::now(),
                result: None,
            },
        };
        store.put_document(&document.id, &document).await.unwrap();
        for scorekeeper in [100, 200] {
            let mut draft = DraftEntity::empty(1, scorekeeper);
            draft.submitted = true;
            store.save_draft(draft).await.unwrap();
        }
    }

    fn review(outcome: ReviewOutcome) -> ReviewEntity {
        ReviewEntity {
            id: Uuid::new_v4(),
            match_id: 1,
            reviewer: "ana".into(),
            outcome,
            comment: Some("wrong jersey".into()),
            reviewed_at: SystemTime::now(),
        }
    }

    async fn submitted(store: &CouchLeagueStore, scorekeeper: ScorekeeperId) -> bool {
        store
            .get_document::<CouchDraftDocument>(&draft_doc_id(1, scorekeeper))
            .await
            .unwrap()
            .unwrap()
            .draft
            .submitted
    }

    #[tokio::test]
    async fn reopen_clears_every_submitted_flag() {
        let (store, _) = fake_store().await;
        seed_match_in_review(&store).await;

        store.reopen_match(review(ReviewOutcome::Rejected)).await.unwrap();

        assert!(!submitted(&store, 100).await);
        assert!(!submitted(&store, 200).await);
        assert_eq!(store.load_match(1).await.unwrap().body.status, MatchStatus::Live);
        assert_eq!(LeagueStore::list_reviews(&store, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_draft_reopen_restores_everything() {
        let (store, couch) = fake_store().await;
        seed_match_in_review(&store).await;
        couch
            .lock()
            .unwrap()
            .failing_puts
            .insert(draft_doc_id(1, 200));

        let err = store
            .reopen_match(review(ReviewOutcome::Rejected))
            .await
            .unwrap_err();

        assert!(matches!(err, CouchDaoError::Compensated { .. }));
        assert!(submitted(&store, 100).await);
        assert!(submitted(&store, 200).await);
        assert_eq!(
            store.load_match(1).await.unwrap().body.status,
            MatchStatus::AdminReview
        );
        assert!(LeagueStore::list_reviews(&store, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_final_sheet_write_removes_the_review() {
        let (store, couch) = fake_store().await;
        seed_match_in_review(&store).await;
        couch.lock().unwrap().failing_puts.insert(match_doc_id(1));

        let finalized = FinalizedMatch {
            result: MatchResultEntity {
                match_id: 1,
                attendance: vec![],
                events: vec![],
                finalized_at: SystemTime::now(),
            },
            review: review(ReviewOutcome::Approved),
        };
        let err = store.finalize_match(finalized).await.unwrap_err();

        assert!(matches!(err, CouchDaoError::Compensated { .. }));
        let document = store.load_match(1).await.unwrap();
        assert_eq!(document.body.status, MatchStatus::AdminReview);
        assert!(document.result_entity().is_none());
        assert!(LeagueStore::list_reviews(&store, 1).await.unwrap().is_empty());
    }
}
