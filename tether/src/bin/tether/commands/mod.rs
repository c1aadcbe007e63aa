pub mod feed;
pub mod graph;
pub mod serve;
pub mod users;

use anyhow::{Context, Result};
use tether::{Client, TetherConfig};

/// Open a client against the configured Redis instance and key prefix.
pub async fn connect(config: &TetherConfig) -> Result<Client> {
    let redis_url = config.redis_url()?;
    Client::connect(&redis_url, config.redis.prefix.clone())
        .await
        .context("Failed to connect to Redis")
}

/// Short form used in table cells.
pub fn short_date(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
