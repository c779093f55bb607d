use std::time::Duration;

use mongodb::{
    Client, Database,
    bson::{Document, doc},
    options::ClientOptions,
};
use tokio::time::sleep;
use tracing::{debug, info};

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Build a client, wait until the server answers, and make sure the
/// deployment can run the multi-document transactions used to finalize
/// match sheets.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    wait_for_server(&database).await?;
    let topology = describe_topology(&database).await?;
    info!(database = database_name, %topology, "MongoDB deployment accepts transactions");

    Ok((client, database))
}

async fn wait_for_server(database: &Database) -> MongoResult<()> {
    let mut delay = FIRST_PING_DELAY;
    for attempt in 1..=PING_ATTEMPTS {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(()),
            Err(source) if attempt == PING_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(attempt, error = %err, database = database.name(), "MongoDB not reachable yet");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_PING_DELAY);
            }
        }
    }
    Ok(())
}

/// Replica set name or `sharded`, failing on standalone servers.
async fn describe_topology(database: &Database) -> MongoResult<String> {
    let hello = database
        .run_command(doc! { "hello": 1 })
        .await
        .map_err(|source| MongoDaoError::HealthPing { source })?;
    topology_of(&hello).ok_or(MongoDaoError::TransactionsUnsupported)
}

fn topology_of(hello: &Document) -> Option<String> {
    if let Ok(set_name) = hello.get_str("setName") {
        return Some(format!("replica set `{set_name}`"));
    }
    match hello.get_str("msg") {
        Ok("isdbgrid") => Some("sharded".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_sets_and_mongos_support_transactions() {
        assert_eq!(
            topology_of(&doc! { "isWritablePrimary": true, "setName": "rs0" }).as_deref(),
            Some("replica set `rs0`")
        );
        assert_eq!(
            topology_of(&doc! { "msg": "isdbgrid" }).as_deref(),
            Some("sharded")
        );
    }

    #[test]
    fn standalone_servers_are_refused() {
        assert!(topology_of(&doc! { "isWritablePrimary": true }).is_none());
    }
}
