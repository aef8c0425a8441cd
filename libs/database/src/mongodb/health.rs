use mongodb::{Client, bson::doc};
use std::time::Instant;

/// Health check status for MongoDB
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error detail when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// `ping` the given database; `true` when the server answered.
pub async fn check_health(client: &Client, database: &str) -> bool {
    check_health_detailed(client, database).await.healthy
}

/// Like [`check_health`], with round-trip timing and the failure message.
pub async fn check_health_detailed(client: &Client, database: &str) -> HealthStatus {
    let start = Instant::now();
    let result = client
        .database(database)
        .run_command(doc! { "ping": 1 })
        .await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}
