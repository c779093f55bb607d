//! Library crate for planilla-back: two-scorekeeper match sheets, their
//! reconciliation and the review workflow, exposed for the binaries and tests.

/// Configuration file loading.
pub mod config;
/// Persistence layer.
pub mod dao;
/// Wire types.
pub mod dto;
/// Error types and their HTTP mapping.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Reconciliation, resolution and validation of match sheets.
pub mod scoresheet;
/// Business operations behind the routes.
pub mod services;
/// Shared application state and the match lifecycle.
pub mod state;
