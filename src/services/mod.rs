/// OpenAPI documentation generation.
pub mod documentation;
/// Scorekeeper drafts and the two-draft read.
pub mod draft_service;
/// Health check service.
pub mod health_service;
/// Match lifecycle and public reads.
pub mod match_service;
/// Reconciliation, preview and the final review decision.
pub mod review_service;
/// Storage connection supervision and degraded mode.
pub mod storage_supervisor;
