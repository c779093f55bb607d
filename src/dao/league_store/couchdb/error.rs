//! Error types shared by the CouchDB storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::scoresheet::MatchId;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The database name breaks CouchDB's naming rules.
    #[error("`{database}` is not a valid CouchDB database name")]
    InvalidDatabaseName { database: String },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a GET against the target database.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    /// The database endpoint answered with an unexpected status.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A document endpoint answered with an unexpected status.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A document did not match the expected shape.
    #[error("failed to deserialize CouchDB value for `{path}`")]
    DeserializeValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The match document vanished between the read and the write.
    #[error("match `{match_id}` does not exist")]
    MissingMatch { match_id: MatchId },
    /// A multi-document write failed and the documents already written were removed.
    #[error("write on match `{match_id}` failed while trying to {step}; earlier writes were undone")]
    Compensated {
        match_id: MatchId,
        step: &'static str,
        #[source]
        source: Box<CouchDaoError>,
    },
}

impl CouchDaoError {
    /// Whether the error left no partial effect behind.
    pub fn is_aborted_write(&self) -> bool {
        matches!(
            self,
            CouchDaoError::MissingMatch { .. } | CouchDaoError::Compensated { .. }
        )
    }
}
