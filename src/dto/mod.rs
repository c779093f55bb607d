use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Scorekeeper payloads.
pub mod draft;
/// Healthcheck payloads.
pub mod health;
/// Match, final sheet and raw draft read models.
pub mod matches;
/// Review payloads.
pub mod review;
/// Extractors validating request payloads and paths.
pub mod validation;

use serde::Serialize;
use utoipa::ToSchema;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Acknowledgement returned by action endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Always `true`; failures answer with an error body instead.
    pub success: bool,
    /// Human-readable acknowledgement.
    pub message: String,
}

impl ActionResponse {
    /// Successful acknowledgement carrying `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
