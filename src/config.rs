use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::device::Dialect;
use crate::error::ConfigError;
use crate::parser::{Field, TemplateSchema};

/// Shortest poll interval a station is asked to serve
pub const MIN_FREQUENCY_MS: u64 = 5000;
pub const DEFAULT_FREQUENCY_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub name: String,
    pub ip_address: Option<String>,
    pub server_address: Option<String>,
    pub port: Option<u16>,
    pub frequency_ms: u64,
    pub password: String,
    pub debug: bool,
    pub dialect: Dialect,
    pub scheme: String,
    pub schema: TemplateSchema,
    pub json_url: Option<String>,
    pub metric_urls: HashMap<Field, String>,
}

/// Non-fatal configuration problem, logged once when the station starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    BothAddresses { station: String },
    FrequencyBelowFloor { station: String, requested: u64 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::BothAddresses { station } => write!(
                f,
                "{}: both ip_address and server_address are set, only define one. Using ip_address",
                station
            ),
            ConfigWarning::FrequencyBelowFloor { station, requested } => write!(
                f,
                "{}: frequency {} ms is below the minimum, polling every {} ms",
                station, requested, MIN_FREQUENCY_MS
            ),
        }
    }
}

impl StationConfig {
    /// Station with default settings for the given dialect
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            ip_address: None,
            server_address: None,
            port: None,
            frequency_ms: DEFAULT_FREQUENCY_MS,
            password: String::new(),
            debug: false,
            dialect,
            scheme: "http".to_string(),
            schema: TemplateSchema::default(),
            json_url: None,
            metric_urls: HashMap::new(),
        }
    }

    /// Host to connect to; the IP address wins when both are configured
    pub fn host(&self) -> &str {
        self.ip_address
            .as_deref()
            .or(self.server_address.as_deref())
            .unwrap_or_default()
    }

    /// Poll interval with the minimum frequency enforced
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.frequency_ms.max(MIN_FREQUENCY_MS))
    }

    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.ip_address.is_some() && self.server_address.is_some() {
            warnings.push(ConfigWarning::BothAddresses {
                station: self.name.clone(),
            });
        }
        if self.frequency_ms < MIN_FREQUENCY_MS {
            warnings.push(ConfigWarning::FrequencyBelowFloor {
                station: self.name.clone(),
                requested: self.frequency_ms,
            });
        }
        warnings
    }

    /// Read `STATION_<index>_*` variables
    fn from_vars(index: &str, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let prefix = format!("STATION_{}_", index);
        let get = |key: &str| {
            vars.get(&format!("{}{}", prefix, key))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let name = get("NAME").unwrap_or("Meteohub").to_string();
        let invalid = |key: &'static str, value: &str| ConfigError::InvalidValue {
            station: name.clone(),
            key,
            value: value.to_string(),
        };

        let dialect = match get("TYPE") {
            Some(value) => Dialect::from_name(value).ok_or_else(|| ConfigError::UnknownDialect {
                station: name.clone(),
                value: value.to_string(),
            })?,
            None => Dialect::default(),
        };

        let mut config = StationConfig::new(name.clone(), dialect);
        config.ip_address = get("IP_ADDRESS").map(str::to_string);
        config.server_address = get("SERVER_ADDRESS").map(str::to_string);
        if config.ip_address.is_none() && config.server_address.is_none() {
            return Err(ConfigError::MissingAddress {
                station: name.clone(),
            });
        }

        if let Some(port) = get("PORT") {
            config.port = Some(port.parse().map_err(|_| invalid("port", port))?);
        }
        if let Some(frequency) = get("FREQUENCY") {
            config.frequency_ms = frequency
                .parse()
                .map_err(|_| invalid("frequency", frequency))?;
        }
        if let Some(scheme) = get("SCHEME") {
            config.scheme = scheme.to_ascii_lowercase();
        }
        config.password = get("PASSWORD").unwrap_or_default().to_string();
        config.debug = get("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        config.json_url = get("JSON_URL").map(str::to_string);

        if let Some(fields) = get("FIELDS") {
            let fields = fields
                .split(',')
                .map(|f| {
                    Field::from_name(f).ok_or_else(|| ConfigError::UnknownField {
                        station: name.clone(),
                        value: f.trim().to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            config.schema = TemplateSchema::new(fields)
                .ok_or_else(|| ConfigError::MissingMandatoryField { station: name.clone() })?;
        }

        // Per-metric URL templates: STATION_<N>_<FIELD>_URL
        for (key, value) in vars {
            let Some(metric) = key
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix("_URL"))
            else {
                continue;
            };
            if metric == "JSON" || value.trim().is_empty() {
                continue;
            }
            let field = Field::from_name(metric).ok_or_else(|| ConfigError::UnknownField {
                station: name.clone(),
                value: metric.to_string(),
            })?;
            config.metric_urls.insert(field, value.trim().to_string());
        }

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stations: Vec<StationConfig>,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Build the configuration from `STATION_<N>_*` variables
    ///
    /// Stations are numbered by `<N>`; any variable of a station marks it as
    /// configured. `DATABASE_URL` is optional.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let mut indexes: BTreeMap<u32, String> = BTreeMap::new();
        for key in vars.keys() {
            if let Some(index) = key
                .strip_prefix("STATION_")
                .and_then(|rest| rest.split_once('_'))
                .map(|(index, _)| index)
            {
                if let Ok(number) = index.parse::<u32>() {
                    indexes.insert(number, index.to_string());
                }
            }
        }

        let mut stations = Vec::new();
        for index in indexes.values() {
            let station = StationConfig::from_vars(index, &vars)?;
            debug!(
                "Station {}: {} ({:?}) at {}",
                index,
                station.name,
                station.dialect,
                station.host()
            );
            stations.push(station);
        }

        info!("Total stations loaded: {}", stations.len());

        if stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        let database_url = vars
            .get("DATABASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(AppConfig {
            stations,
            database_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn loads_numbered_stations() {
        let config = AppConfig::from_vars(vars(&[
            ("STATION_2_NAME", "Roof"),
            ("STATION_2_SERVER_ADDRESS", "meteohub.local"),
            ("STATION_2_TYPE", "meteohub"),
            ("STATION_1_NAME", "Garden"),
            ("STATION_1_IP_ADDRESS", "192.168.1.20"),
            ("STATION_1_PORT", "8080"),
            ("STATION_1_PASSWORD", "secret"),
            ("STATION_1_DEBUG", "TRUE"),
            ("DATABASE_URL", "postgres://weather@localhost/weather"),
        ]))
        .unwrap();

        assert_eq!(config.stations.len(), 2);
        let garden = &config.stations[0];
        assert_eq!(garden.name, "Garden");
        assert_eq!(garden.port, Some(8080));
        assert_eq!(garden.password, "secret");
        assert!(garden.debug);
        assert_eq!(garden.dialect, Dialect::TemplatedSingleMetric);
        assert_eq!(config.stations[1].dialect, Dialect::XmlFull);
        assert_eq!(config.stations[1].host(), "meteohub.local");
        assert!(config.database_url.is_some());
    }

    #[test]
    fn no_stations_is_an_error() {
        let err = AppConfig::from_vars(vars(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::NoStations));
    }

    #[test]
    fn station_without_address_is_an_error() {
        let err = AppConfig::from_vars(vars(&[("STATION_1_NAME", "Garden")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAddress { .. }));
    }

    #[test]
    fn frequency_below_floor_is_clamped_with_one_warning() {
        let config = AppConfig::from_vars(vars(&[
            ("STATION_1_IP_ADDRESS", "192.168.1.20"),
            ("STATION_1_FREQUENCY", "1000"),
        ]))
        .unwrap();
        let station = &config.stations[0];

        assert_eq!(station.poll_interval(), Duration::from_millis(5000));
        assert_eq!(
            station.warnings(),
            vec![ConfigWarning::FrequencyBelowFloor {
                station: "Meteohub".to_string(),
                requested: 1000,
            }]
        );
    }

    #[test]
    fn ip_address_wins_over_server_address() {
        let mut station = StationConfig::new("Garden", Dialect::XmlFull);
        station.ip_address = Some("10.0.0.5".to_string());
        station.server_address = Some("weather.example.com".to_string());

        assert_eq!(station.host(), "10.0.0.5");
        assert_eq!(station.warnings().len(), 1);
        assert!(matches!(station.warnings()[0], ConfigWarning::BothAddresses { .. }));
    }

    #[test]
    fn field_list_and_metric_urls() {
        let config = AppConfig::from_vars(vars(&[
            ("STATION_1_IP_ADDRESS", "192.168.1.20"),
            ("STATION_1_TYPE", "meteobridge-multi"),
            ("STATION_1_FIELDS", "temperature, humidity, pressure, wind"),
            ("STATION_1_PRESSURE_URL", "http://192.168.1.21/pressure.txt"),
            ("STATION_1_JSON_URL", "http://192.168.1.20/all.txt"),
        ]))
        .unwrap();
        let station = &config.stations[0];

        assert_eq!(
            station.schema.fields(),
            &[Field::Temperature, Field::Humidity, Field::Pressure, Field::WindSpeed]
        );
        assert_eq!(
            station.metric_urls.get(&Field::Pressure).map(String::as_str),
            Some("http://192.168.1.21/pressure.txt")
        );
        assert_eq!(station.metric_urls.len(), 1);
        assert_eq!(station.json_url.as_deref(), Some("http://192.168.1.20/all.txt"));
    }

    #[test]
    fn field_list_without_humidity_is_rejected() {
        let err = AppConfig::from_vars(vars(&[
            ("STATION_1_IP_ADDRESS", "192.168.1.20"),
            ("STATION_1_FIELDS", "temperature,pressure"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMandatoryField { .. }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = AppConfig::from_vars(vars(&[
            ("STATION_1_IP_ADDRESS", "192.168.1.20"),
            ("STATION_1_TYPE", "davis"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDialect { .. }));
    }
}
