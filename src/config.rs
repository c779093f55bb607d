//! Application-level configuration loading: validation tunables and the
//! reviewers allowed on the administrative routes.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::scoresheet::{JerseyScope, ValidationRules, validator::DEFAULT_MAX_MINUTE};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLANILLA_BACK_CONFIG_PATH";

/// Administrator allowed to review match sheets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reviewer {
    /// Name written into the audit trail.
    pub name: String,
    /// Value expected in the `X-Admin-Token` header.
    pub token: String,
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: ValidationRules,
    reviewers: Vec<Reviewer>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        reviewers = app_config.reviewers.len(),
                        max_minute = app_config.rules.max_minute,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults (no reviewer configured)"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Add a reviewer, mostly useful to build configurations in code.
    pub fn with_reviewer(mut self, name: impl Into<String>, token: impl Into<String>) -> Self {
        self.reviewers.push(Reviewer {
            name: name.into(),
            token: token.into(),
        });
        self
    }

    /// Replace the validation tunables.
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Rules applied to every preview and approval.
    pub fn validation_rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Every configured reviewer.
    pub fn reviewers(&self) -> &[Reviewer] {
        &self.reviewers
    }

    /// Reviewer owning `token`, if any.
    pub fn reviewer_for_token(&self, token: &str) -> Option<&Reviewer> {
        self.reviewers
            .iter()
            .find(|reviewer| !reviewer.token.is_empty() && reviewer.token == token)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    validation: RawValidation,
    reviewers: Vec<Reviewer>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawValidation {
    max_minute: i32,
    jersey_scope: JerseyScope,
}

impl Default for RawValidation {
    fn default() -> Self {
        Self {
            max_minute: DEFAULT_MAX_MINUTE,
            jersey_scope: JerseyScope::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rules: ValidationRules {
                max_minute: value.validation.max_minute,
                jersey_scope: value.validation.jersey_scope,
            },
            reviewers: value.reviewers,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"reviewers": [{"name": "Marta", "token": "s3cret"}]}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.validation_rules(), &ValidationRules::default());
        assert_eq!(config.reviewer_for_token("s3cret").unwrap().name, "Marta");
        assert!(config.reviewer_for_token("other").is_none());
    }

    #[test]
    fn reads_validation_tunables() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"validation": {"max_minute": 90, "jersey_scope": "team"}}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.validation_rules().max_minute, 90);
        assert_eq!(config.validation_rules().jersey_scope, JerseyScope::Team);
    }

    #[test]
    fn empty_tokens_never_match() {
        let config = AppConfig::default().with_reviewer("nobody", "");
        assert!(config.reviewer_for_token("").is_none());
    }
}
