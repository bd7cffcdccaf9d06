use crate::characteristics::Channel;

/// One snapshot of station state
///
/// Every measurement stays `None` until a response supplies it. Channels the
/// active dialect never reports stay `None` for good and read back as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub pressure: Option<f32>,
    pub uv_index: Option<u8>,
    pub wind_speed: Option<f32>,
    pub low_battery: Option<bool>,
    pub timestamp: i64,
}

impl Reading {
    pub fn get(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Pressure => self.pressure,
            Channel::UvIndex => self.uv_index.map(f32::from),
            Channel::WindSpeed => self.wind_speed,
        }
    }

    /// Value of a channel, or the neutral 0 when the channel was never reported
    pub fn value(&self, channel: Channel) -> f32 {
        self.get(channel).unwrap_or(0.0)
    }

    /// Value clamped into the channel's published range; unreported stays 0
    pub fn published(&self, channel: Channel) -> f32 {
        self.get(channel)
            .map(|v| channel.definition().clamp(v))
            .unwrap_or(0.0)
    }
}

/// Outcome of the most recent poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    #[default]
    None = 0,
    InvalidData = 1,
    Unreachable = 2,
}

impl Fault {
    /// Numeric code published to the accessory platform
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub active: bool,
    pub fault: Fault,
    pub low_battery: bool,
}

/// One row for the history sink
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub time: i64,
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
}

impl HistoryEntry {
    /// Build an entry from the cached reading; unreported channels become 0
    pub fn from_reading(reading: &Reading, time: i64) -> Self {
        Self {
            time,
            temperature: reading.value(Channel::Temperature),
            humidity: reading.value(Channel::Humidity),
            pressure: reading.value(Channel::Pressure),
        }
    }
}

/// Hardware details reported by the station at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Specifications {
    pub serial: String,
    pub model: String,
    pub version: String,
}

impl Default for Specifications {
    fn default() -> Self {
        Self {
            serial: "Unknown".to_string(),
            model: "Unknown".to_string(),
            version: "0.0".to_string(),
        }
    }
}
