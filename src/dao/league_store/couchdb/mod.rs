mod config;
mod error;
mod models;
/// [`LeagueStore`](crate::dao::league_store::LeagueStore) implementation over CouchDB.
pub mod store;

pub use config::{CouchConfig, CouchCredentials};
pub use error::CouchDaoError;
pub use store::CouchLeagueStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        if err.is_aborted_write() {
            StorageError::aborted(err.to_string(), err)
        } else {
            StorageError::unavailable(err.to_string(), err)
        }
    }
}
