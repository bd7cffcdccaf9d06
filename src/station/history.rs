/// Fixed-cadence history recording of one station
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::SinkError;
use crate::models::HistoryEntry;
use crate::station::Station;
use crate::utils::format_epoch;

/// 10 seconds short of 10 minutes so a viewer with 10 minute buckets never sees a gap
pub const HISTORY_INTERVAL: Duration = Duration::from_secs(10 * 60 - 10);
pub const HISTORY_FIRST_DELAY: Duration = Duration::from_secs(10);

/// Durable, append-only store of history entries
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn add_entry(&self, station: &str, entry: &HistoryEntry) -> Result<(), SinkError>;
}

/// Sink used when no database is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHistorySink;

#[async_trait]
impl HistorySink for LogHistorySink {
    async fn add_entry(&self, station: &str, entry: &HistoryEntry) -> Result<(), SinkError> {
        info!(
            "{}: history {} temperature={:.1} humidity={:.0} pressure={:.1}",
            station,
            format_epoch(entry.time),
            entry.temperature,
            entry.humidity,
            entry.pressure
        );
        Ok(())
    }
}

/// Start the history feeder of a station
///
/// The first entry is written 10 seconds after the call, then every
/// `HISTORY_INTERVAL`. Entries come from the cached reading; the station is
/// never contacted. Sink failures are logged and the feeder carries on.
pub fn spawn_history_feeder(
    station: Station,
    sink: Arc<dyn HistorySink>,
    shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(run(station, sink, shutdown))
}

async fn run(station: Station, sink: Arc<dyn HistorySink>, mut shutdown: watch::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + HISTORY_FIRST_DELAY, HISTORY_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                info!("{}: history feeder stopped", station.name());
                break;
            }
        }

        let entry = station.history_entry().await;
        if station.debug() {
            info!(
                "{}: Saving history for Temperature: {}, Humidity: {}, Pressure: {} @ time {}",
                station.name(),
                entry.temperature,
                entry.humidity,
                entry.pressure,
                entry.time
            );
        }

        if let Err(e) = sink.add_entry(station.name(), &entry).await {
            error!("{}: failed to store history entry: {}", station.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use crate::device::Dialect;
    use crate::station::testing::*;
    use std::sync::Mutex;
    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<HistoryEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl HistorySink for RecordingSink {
        async fn add_entry(&self, _station: &str, entry: &HistoryEntry) -> Result<(), SinkError> {
            self.entries.lock().unwrap().push(entry.clone());
            if self.fail {
                return Err(SinkError::Database("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn station(source: Arc<ScriptedSource>) -> Station {
        let mut config = StationConfig::new("Garden", Dialect::XmlFull);
        config.ip_address = Some("192.168.1.20".to_string());
        Station::new(&config, source, Arc::new(RecordingPublisher::default()))
    }

    #[test]
    fn cadence_is_nine_minutes_fifty() {
        assert_eq!(HISTORY_INTERVAL, Duration::from_secs(590));
    }

    #[tokio::test(start_paused = true)]
    async fn records_cached_reading_on_cadence() {
        let source = Arc::new(ScriptedSource::new(vec![Outcome::Ok(reading(20.0, 50.0))]));
        let station = station(source.clone());
        station.cycle().await;

        let sink = Arc::new(RecordingSink::default());
        let (_shutdown_tx, shutdown_rx) = watch::channel(());
        spawn_history_feeder(station, sink.clone(), shutdown_rx);

        sleep(Duration::from_secs(9)).await;
        assert!(sink.entries.lock().unwrap().is_empty());

        sleep(Duration::from_secs(2)).await;
        {
            let entries = sink.entries.lock().unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].temperature, 20.0);
            assert_eq!(entries[0].humidity, 50.0);
            assert_eq!(entries[0].pressure, 0.0);
            assert!(entries[0].time > 0);
        }

        sleep(HISTORY_INTERVAL).await;
        assert_eq!(sink.entries.lock().unwrap().len(), 2);
        // only the explicit cycle above contacted the station
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sink_errors_do_not_stop_the_feeder() {
        let source = Arc::new(ScriptedSource::new(vec![Outcome::Unreachable]));
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let (_shutdown_tx, shutdown_rx) = watch::channel(());
        spawn_history_feeder(station(source), sink.clone(), shutdown_rx);

        sleep(HISTORY_FIRST_DELAY + HISTORY_INTERVAL * 2 + Duration::from_secs(1)).await;
        assert_eq!(sink.entries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn log_sink_accepts_entries() {
        let entry = HistoryEntry {
            time: 1_700_000_000,
            temperature: 20.0,
            humidity: 50.0,
            pressure: 0.0,
        };
        assert!(LogHistorySink.add_entry("Garden", &entry).await.is_ok());
    }
}
