/// Database operations for storing weather history
use async_trait::async_trait;
use time::OffsetDateTime;

use crate::database::connection::execute_with_retry;
use crate::error::SinkError;
use crate::models::HistoryEntry;
use crate::station::HistorySink;

/// Create the history table if it does not exist yet
pub async fn ensure_history_table(database_url: &str) -> Result<(), String> {
    execute_with_retry(database_url, |client| async move {
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS weather_history (
                    id BIGSERIAL PRIMARY KEY,
                    station TEXT NOT NULL,
                    temperature REAL NOT NULL,
                    humidity REAL NOT NULL,
                    pressure REAL NOT NULL,
                    time TIMESTAMPTZ NOT NULL
                )",
                &[],
            )
            .await
    })
    .await
}

/// Store one history entry in the weather_history table
///
/// It uses the retry mechanism to handle transient database connection issues.
///
/// # Arguments
/// * `station` - Configured station name
/// * `entry` - History entry to store
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// Result indicating success or failure
pub async fn store_history_entry(
    station: &str,
    entry: &HistoryEntry,
    database_url: &str,
) -> Result<(), String> {
    let time = OffsetDateTime::from_unix_timestamp(entry.time)
        .map_err(|e| format!("Invalid entry time {}: {}", entry.time, e))?;

    // Clone data for move into async closure
    let station = station.to_string();
    let entry = entry.clone();

    execute_with_retry(database_url, move |client| {
        let station = station.clone();
        let entry = entry.clone();
        async move {
            client
                .execute(
                    "INSERT INTO weather_history(station, temperature, humidity, pressure, time)
                     VALUES ($1, $2, $3, $4, $5)",
                    &[
                        &station,
                        &entry.temperature,
                        &entry.humidity,
                        &entry.pressure,
                        &time,
                    ],
                )
                .await
        }
    })
    .await
}

/// History sink writing to PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresHistorySink {
    database_url: String,
}

impl PostgresHistorySink {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl HistorySink for PostgresHistorySink {
    async fn add_entry(&self, station: &str, entry: &HistoryEntry) -> Result<(), SinkError> {
        store_history_entry(station, entry, &self.database_url)
            .await
            .map_err(SinkError::Database)
    }
}
