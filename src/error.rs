/// Error types for parsing, fetching, configuration and history storage
use thiserror::Error;

use crate::models::Fault;

/// A station response that could not be turned into a reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{0} missing from response")]
    MissingField(&'static str),

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("malformed XML: {0}")]
    MalformedXml(String),
}

/// Failure of one fetch against a station
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("station unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("invalid data from {url}: {source}")]
    InvalidData {
        url: String,
        #[source]
        source: ParseError,
    },
}

impl FetchError {
    pub fn fault(&self) -> Fault {
        match self {
            FetchError::Unreachable { .. } => Fault::Unreachable,
            FetchError::InvalidData { .. } => Fault::InvalidData,
        }
    }
}

/// Configuration that cannot be used at all
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no stations configured. Please set STATION_<N>_NAME and STATION_<N>_IP_ADDRESS or STATION_<N>_SERVER_ADDRESS")]
    NoStations,

    #[error("station {station}: neither ip_address nor server_address is set")]
    MissingAddress { station: String },

    #[error("station {station}: unknown station type {value:?}")]
    UnknownDialect { station: String, value: String },

    #[error("station {station}: unknown field {value:?}")]
    UnknownField { station: String, value: String },

    #[error("station {station}: field list must contain temperature and humidity")]
    MissingMandatoryField { station: String },

    #[error("station {station}: invalid {key}: {value:?}")]
    InvalidValue {
        station: String,
        key: &'static str,
        value: String,
    },
}

/// Failure of the history sink to accept an entry
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(String),
}
