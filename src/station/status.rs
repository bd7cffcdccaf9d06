/// Status derivation for one poll cycle
use crate::error::FetchError;
use crate::models::{Fault, Reading, Status};

/// Compute the status that follows a fetch outcome
///
/// No hysteresis: one failed cycle faults the station, one good cycle
/// clears it. Failed cycles carry no battery information, so the last
/// reported low battery flag is kept.
pub fn next_status(outcome: &Result<Reading, FetchError>, previous: Status) -> Status {
    match outcome {
        Ok(reading) => Status {
            active: true,
            fault: Fault::None,
            low_battery: reading.low_battery.unwrap_or(false),
        },
        Err(e) => Status {
            active: false,
            fault: e.fault(),
            low_battery: previous.low_battery,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn unreachable() -> FetchError {
        FetchError::Unreachable {
            url: "http://192.168.1.20/".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    fn invalid() -> FetchError {
        FetchError::InvalidData {
            url: "http://192.168.1.20/".to_string(),
            source: ParseError::NotANumber {
                field: "temperature",
                value: "NaN".to_string(),
            },
        }
    }

    #[test]
    fn success_clears_fault() {
        let previous = Status {
            active: false,
            fault: Fault::Unreachable,
            low_battery: true,
        };
        let reading = Reading {
            temperature: Some(21.5),
            humidity: Some(48.0),
            low_battery: Some(false),
            ..Default::default()
        };

        assert_eq!(
            next_status(&Ok(reading), previous),
            Status {
                active: true,
                fault: Fault::None,
                low_battery: false,
            }
        );
    }

    #[test]
    fn unreported_battery_is_not_low() {
        let status = next_status(&Ok(Reading::default()), Status::default());
        assert!(!status.low_battery);
    }

    #[test]
    fn failures_map_to_faults() {
        let previous = Status {
            active: true,
            fault: Fault::None,
            low_battery: true,
        };

        let status = next_status(&Err(unreachable()), previous);
        assert_eq!(status.fault, Fault::Unreachable);
        assert!(!status.active);
        assert!(status.low_battery);

        let status = next_status(&Err(invalid()), previous);
        assert_eq!(status.fault, Fault::InvalidData);
        assert!(!status.active);
    }
}
