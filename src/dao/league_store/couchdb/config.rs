use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "planilla";

/// Basic-auth pair for the CouchDB server.
#[derive(Debug, Clone)]
pub struct CouchCredentials {
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

/// Where the CouchDB league database lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without a trailing slash.
    pub base_url: String,
    /// Database holding every league document.
    pub database: String,
    /// Credentials sent with every request, if any.
    pub credentials: Option<CouchCredentials>,
}

impl CouchConfig {
    /// Validate the database name against CouchDB's naming rules.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> CouchResult<Self> {
        let database = database.into();
        if !is_valid_database_name(&database) {
            return Err(CouchDaoError::InvalidDatabaseName { database });
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            database,
            credentials: None,
        })
    }

    /// Authenticate every request with basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(CouchCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair. A lone username or password
    /// is a configuration error.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var("COUCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DATABASE.to_owned());
        let config = Self::new(base_url, database)?;

        match (env::var("COUCH_USERNAME").ok(), env::var("COUCH_PASSWORD").ok()) {
            (Some(username), Some(password)) => Ok(config.with_credentials(username, password)),
            (None, None) => Ok(config),
            (Some(_), None) => Err(CouchDaoError::MissingEnvVar {
                var: "COUCH_PASSWORD",
            }),
            (None, Some(_)) => Err(CouchDaoError::MissingEnvVar {
                var: "COUCH_USERNAME",
            }),
        }
    }
}

/// Lowercase letter first, then lowercase letters, digits or `_$()+-/`.
fn is_valid_database_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+-/".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_follow_couchdb_rules() {
        assert!(is_valid_database_name("planilla"));
        assert!(is_valid_database_name("league_2024-spring"));
        assert!(!is_valid_database_name("Planilla"));
        assert!(!is_valid_database_name("_users"));
        assert!(!is_valid_database_name(""));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let config = CouchConfig::new("http://couch:5984/", "planilla").unwrap();
        assert_eq!(config.base_url, "http://couch:5984");
        assert!(config.credentials.is_none());
    }
}
