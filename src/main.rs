use futures_util::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::watch;

use meteohub_bridge::config::AppConfig;
use meteohub_bridge::database::{ensure_history_table, PostgresHistorySink};
use meteohub_bridge::station::{
    spawn_history_feeder, spawn_poller, AccessoryPublisher, HistorySink, LogHistorySink,
    LogPublisher, Station,
};
use meteohub_bridge::utils::format_datetime;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match AppConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Starting weather station bridge at: {}",
        format_datetime(&time::OffsetDateTime::now_utc())
    );

    let sink: Arc<dyn HistorySink> = match &config.database_url {
        Some(database_url) => {
            if let Err(e) = ensure_history_table(database_url).await {
                warn!("Unable to prepare weather_history table: {}", e);
            }
            Arc::new(PostgresHistorySink::new(database_url.clone()))
        }
        None => {
            info!("DATABASE_URL not set, history entries are only logged");
            Arc::new(LogHistorySink)
        }
    };
    let publisher: Arc<dyn AccessoryPublisher> = Arc::new(LogPublisher);

    let mut stations = Vec::new();
    for station_config in config.stations {
        stations.push(Station::from_config(station_config, publisher.clone())?);
    }

    // Specifications are read once before any station starts polling
    join_all(stations.iter().map(|station| station.initialize())).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut handles = Vec::new();
    for station in &stations {
        handles.push(spawn_poller(station.clone(), shutdown_rx.clone()));
        handles.push(spawn_history_feeder(
            station.clone(),
            sink.clone(),
            shutdown_rx.clone(),
        ));
    }
    info!("Running {} station(s)", stations.len());

    // Handle Ctrl+C gracefully
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Program terminated by user. Exiting gracefully.");

    let _ = shutdown_tx.send(());
    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("Station task failed: {}", e);
        }
    }

    Ok(())
}
