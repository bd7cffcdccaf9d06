/// Characteristic definitions exposed to the accessory platform
use uuid::{uuid, Uuid};

use crate::models::Specifications;

// --- Custom weather service ---

/// Weather sensor service carrying pressure, UV and wind.
pub const WEATHER_SENSOR_SERVICE: Uuid = uuid!("91c9e63b-4319-4983-92bd-604ca8ce2063");

// --- Custom characteristics ---

pub const AIR_PRESSURE: Uuid = uuid!("7e4d6810-5dd3-45ea-a24f-7190f883e2f6");

pub const WIND_SPEED: Uuid = uuid!("2566e99c-f091-48d9-b977-f93d69264deb");

pub const UV_INDEX: Uuid = uuid!("5e1d5b4e-8320-4ffe-8fc6-00591bf24bf7");

// --- Standard platform characteristics ---

pub const CURRENT_TEMPERATURE: Uuid = uuid!("00000011-0000-1000-8000-0026bb765291");

pub const CURRENT_RELATIVE_HUMIDITY: Uuid = uuid!("00000010-0000-1000-8000-0026bb765291");

pub const MANUFACTURER: &str = "smartbedded GmbH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Float,
    UInt8,
}

/// Static description of one published attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicDef {
    pub name: &'static str,
    pub uuid: Uuid,
    pub format: Format,
    pub unit: Option<&'static str>,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl CharacteristicDef {
    /// Clamp a value into the published range
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

pub const TEMPERATURE_DEF: CharacteristicDef = CharacteristicDef {
    name: "Current Temperature",
    uuid: CURRENT_TEMPERATURE,
    format: Format::Float,
    unit: Some("celsius"),
    min: -20.0,
    max: 120.0,
    step: 0.1,
};

pub const HUMIDITY_DEF: CharacteristicDef = CharacteristicDef {
    name: "Current Relative Humidity",
    uuid: CURRENT_RELATIVE_HUMIDITY,
    format: Format::Float,
    unit: Some("percentage"),
    min: 0.0,
    max: 100.0,
    step: 1.0,
};

pub const AIR_PRESSURE_DEF: CharacteristicDef = CharacteristicDef {
    name: "Air Pressure",
    uuid: AIR_PRESSURE,
    format: Format::Float,
    unit: Some("hPa"),
    min: 600.0,
    max: 1200.0,
    step: 0.1,
};

pub const WIND_SPEED_DEF: CharacteristicDef = CharacteristicDef {
    name: "Wind Speed",
    uuid: WIND_SPEED,
    format: Format::Float,
    unit: Some("m/s"),
    min: 0.0,
    max: 1000.0,
    step: 0.1,
};

pub const UV_INDEX_DEF: CharacteristicDef = CharacteristicDef {
    name: "UV Index",
    uuid: UV_INDEX,
    format: Format::UInt8,
    unit: None,
    min: 0.0,
    max: 10.0,
    step: 1.0,
};

/// A measurement channel of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Temperature,
    Humidity,
    Pressure,
    UvIndex,
    WindSpeed,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Pressure,
        Channel::UvIndex,
        Channel::WindSpeed,
    ];

    pub fn definition(self) -> &'static CharacteristicDef {
        match self {
            Channel::Temperature => &TEMPERATURE_DEF,
            Channel::Humidity => &HUMIDITY_DEF,
            Channel::Pressure => &AIR_PRESSURE_DEF,
            Channel::UvIndex => &UV_INDEX_DEF,
            Channel::WindSpeed => &WIND_SPEED_DEF,
        }
    }
}

/// Accessory information block derived from the station specifications
#[derive(Debug, Clone, PartialEq)]
pub struct AccessoryInfo {
    pub manufacturer: &'static str,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
    pub name: String,
}

impl AccessoryInfo {
    pub fn new(specs: &Specifications) -> Self {
        Self {
            manufacturer: MANUFACTURER,
            model: format!("Platform Type: {}", specs.model),
            serial_number: specs.serial.clone(),
            firmware_revision: format!("Meteohub: {}", specs.version),
            name: "Meteohub".to_string(),
        }
    }
}
