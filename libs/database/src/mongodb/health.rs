use mongodb::Client;
use mongodb::bson::doc;

use crate::common::{DatabaseError, DatabaseResult};

/// Ping the server through the `admin` database
pub async fn check_health(client: &Client) -> DatabaseResult<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))
}
