use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017/?replicaSet=rs0";
const DEFAULT_DATABASE: &str = "planilla";
const APP_NAME: &str = "planilla-back";

/// Connection settings for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the URI.
    pub options: ClientOptions,
    /// Database holding the league collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`. Final sheets rely on retryable writes inside transactions,
    /// so a URI turning them off is rejected.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        if options.retry_writes == Some(false) {
            return Err(MongoDaoError::RetryWritesDisabled);
        }
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        let database_name = db_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
            .to_owned();

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` (defaults to a local `rs0` replica set) and `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.to_owned());
        let db = env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_database_name_falls_back_to_default() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some("  "))
            .await
            .unwrap();
        assert_eq!(config.database_name, DEFAULT_DATABASE);
        assert_eq!(config.options.app_name.as_deref(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn disabled_retry_writes_is_refused() {
        let result = MongoConfig::from_uri("mongodb://localhost:27017/?retryWrites=false", None).await;
        assert!(matches!(result, Err(MongoDaoError::RetryWritesDisabled)));
    }
}
