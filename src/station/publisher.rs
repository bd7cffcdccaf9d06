/// Hand-off of readings and status to the accessory platform
use log::{debug, info};

use crate::characteristics::{AccessoryInfo, Channel};
use crate::models::{Reading, Status};

/// Receiver of everything a station exposes as accessory attributes
pub trait AccessoryPublisher: Send + Sync {
    /// Accessory information, sent once when the station is ready
    fn publish_info(&self, _station: &str, _info: &AccessoryInfo) {}

    /// Channel values and status flags after every cycle
    fn publish(&self, station: &str, reading: &Reading, status: &Status);
}

/// Publisher used when no accessory platform is attached; writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl AccessoryPublisher for LogPublisher {
    fn publish_info(&self, station: &str, info: &AccessoryInfo) {
        info!(
            "{}: {} / {} / serial {} / {}",
            station, info.manufacturer, info.model, info.serial_number, info.firmware_revision
        );
    }

    fn publish(&self, station: &str, reading: &Reading, status: &Status) {
        let values = Channel::ALL
            .iter()
            .map(|c| format!("{}={}", c.definition().name, reading.published(*c)))
            .collect::<Vec<_>>()
            .join(", ");

        debug!(
            "{}: {} | active={} fault={} low_battery={}",
            station,
            values,
            status.active,
            status.fault.code(),
            status.low_battery
        );
    }
}
