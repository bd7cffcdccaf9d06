pub mod history;
pub mod poller;
pub mod publisher;
pub mod status;

pub use history::{spawn_history_feeder, HistorySink, LogHistorySink};
pub use poller::spawn_poller;
pub use publisher::{AccessoryPublisher, LogPublisher};

use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::characteristics::{AccessoryInfo, Channel};
use crate::config::StationConfig;
use crate::device::{DeviceClient, ReadingSource};
use crate::error::{ConfigError, FetchError};
use crate::models::{HistoryEntry, Reading, Status};
use crate::utils::unix_now;

/// Cached reading and status of one station
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationState {
    pub reading: Reading,
    pub status: Status,
}

/// Cached reading and status of one configured weather station
///
/// The poller replaces the state every cycle, the history feeder samples it
/// on its own cadence and on-demand reads trigger a fresh fetch.
#[derive(Clone)]
pub struct Station {
    name: String,
    debug: bool,
    poll_interval: Duration,
    source: Arc<dyn ReadingSource>,
    publisher: Arc<dyn AccessoryPublisher>,
    state: Arc<Mutex<StationState>>,
    // Held across fetch and apply so responses are applied in request order
    cycle_lock: Arc<Mutex<()>>,
}

impl Station {
    /// Create a station around any reading source
    ///
    /// Configuration warnings are logged here, once per station.
    pub fn new(
        config: &StationConfig,
        source: Arc<dyn ReadingSource>,
        publisher: Arc<dyn AccessoryPublisher>,
    ) -> Self {
        for warning in config.warnings() {
            warn!("{}", warning);
        }

        Self {
            name: config.name.clone(),
            debug: config.debug,
            poll_interval: config.poll_interval(),
            source,
            publisher,
            state: Arc::new(Mutex::new(StationState::default())),
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a station polling its configured device over HTTP
    pub fn from_config(
        config: StationConfig,
        publisher: Arc<dyn AccessoryPublisher>,
    ) -> Result<Self, ConfigError> {
        let client = DeviceClient::new(config.clone())?;
        Ok(Self::new(&config, Arc::new(client), publisher))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Fetch the station specifications and publish the accessory information
    ///
    /// Awaited once before the station's tasks start.
    pub async fn initialize(&self) -> AccessoryInfo {
        let specs = self.source.fetch_specifications().await;
        info!(
            "{}: Specifications --> Serial Number: {}   Model: {}   Version: {}",
            self.name, specs.serial, specs.model, specs.version
        );

        let info = AccessoryInfo::new(&specs);
        self.publisher.publish_info(&self.name, &info);
        info
    }

    /// Apply one fetch outcome to the cached state and publish the result
    ///
    /// Success replaces the whole reading. Failures keep the previous values
    /// and only fault the status.
    pub async fn apply(&self, outcome: Result<Reading, FetchError>) -> StationState {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.status = status::next_status(&outcome, state.status);
            match outcome {
                Ok(reading) => state.reading = reading,
                Err(e) => error!("{}: error retrieving station data: {}", self.name, e),
            }
            state.clone()
        };

        if self.debug {
            let r = &snapshot.reading;
            info!(
                "{}: Temperature is: {} // Humidity is: {} // Pressure is: {} // UV Index is: {} // Wind Speed: {}",
                self.name,
                r.value(Channel::Temperature),
                r.value(Channel::Humidity),
                r.value(Channel::Pressure),
                r.value(Channel::UvIndex),
                r.value(Channel::WindSpeed)
            );
        }

        self.publisher
            .publish(&self.name, &snapshot.reading, &snapshot.status);
        snapshot
    }

    /// Run one fetch-and-apply cycle
    ///
    /// Cycles started by the poller and by on-demand reads never overlap.
    pub async fn cycle(&self) -> StationState {
        let _guard = self.cycle_lock.lock().await;
        let outcome = self.source.fetch_reading().await;
        self.apply(outcome).await
    }

    /// Current value of a channel, fetched fresh from the station
    pub async fn read(&self, channel: Channel) -> f32 {
        self.cycle().await.reading.published(channel)
    }

    /// Cached state without contacting the station
    pub async fn snapshot(&self) -> StationState {
        self.state.lock().await.clone()
    }

    /// History entry for the cached reading, stamped now
    pub async fn history_entry(&self) -> HistoryEntry {
        let state = self.snapshot().await;
        HistoryEntry::from_reading(&state.reading, unix_now())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::device::ReadingSource;
    use crate::error::{FetchError, ParseError};
    use crate::models::{Reading, Status};
    use crate::station::AccessoryPublisher;

    /// Kind of outcome a scripted source returns
    #[derive(Debug, Clone)]
    pub enum Outcome {
        Ok(Reading),
        Unreachable,
        InvalidData,
    }

    /// Returns scripted outcomes in order, repeating the last one
    pub struct ScriptedSource {
        outcomes: Mutex<VecDeque<Outcome>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(outcomes: Vec<Outcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadingSource for ScriptedSource {
        async fn fetch_reading(&self) -> Result<Reading, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = {
                let mut outcomes = self.outcomes.lock().unwrap();
                if outcomes.len() > 1 {
                    outcomes.pop_front().unwrap()
                } else {
                    outcomes.front().cloned().unwrap()
                }
            };
            match outcome {
                Outcome::Ok(reading) => Ok(reading),
                Outcome::Unreachable => Err(FetchError::Unreachable {
                    url: "http://127.0.0.1:1/".to_string(),
                    reason: "connection refused".to_string(),
                }),
                Outcome::InvalidData => Err(FetchError::InvalidData {
                    url: "http://127.0.0.1:1/".to_string(),
                    source: ParseError::NotANumber {
                        field: "temperature",
                        value: "NaN".to_string(),
                    },
                }),
            }
        }
    }

    /// Keeps every published reading and status
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(Reading, Status)>>,
    }

    impl RecordingPublisher {
        pub fn statuses(&self) -> Vec<Status> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .map(|(_, s)| *s)
                .collect()
        }
    }

    impl AccessoryPublisher for RecordingPublisher {
        fn publish(&self, _station: &str, reading: &Reading, status: &Status) {
            self.published
                .lock()
                .unwrap()
                .push((reading.clone(), *status));
        }
    }

    pub fn reading(temperature: f32, humidity: f32) -> Reading {
        Reading {
            temperature: Some(temperature),
            humidity: Some(humidity),
            low_battery: Some(false),
            timestamp: 1_700_000_000,
            ..Default::default()
        }
    }
}
