mod config;
mod connection;
mod error;
mod models;
/// [`LeagueStore`](crate::dao::league_store::LeagueStore) implementation over MongoDB.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoLeagueStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_aborted_write() {
            StorageError::aborted(err.to_string(), err)
        } else {
            StorageError::unavailable(err.to_string(), err)
        }
    }
}
