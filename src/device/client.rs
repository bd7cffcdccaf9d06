/// HTTP requests against a Meteobridge or Meteohub station
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

use crate::config::StationConfig;
use crate::device::{Dialect, ReadingSource};
use crate::error::{ConfigError, FetchError};
use crate::models::{Reading, Specifications};
use crate::parser::{self, Field};
use crate::utils::{redact_url, unix_now};

const TEMPLATE_PATH: &str = "/cgi-bin/template.cgi";
const LOGGER_PATH: &str = "/meteolog.cgi";
const LOGGER_QUERY: &str = "type=xml&quotes=1&mode=data&info=station&info=utcdate&info=sensorids";
const GRAPH_PATH: &str = "/meteograph.cgi";
const SPECIFICATIONS_TEMPLATE: &str = "[mbsystem-mac],[mbsystem-platform],[mbsystem-swversion]";

/// Fetches readings from one station using its configured dialect
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: Client,
    base: Url,
    json_url: Option<Url>,
    metric_urls: HashMap<Field, Url>,
    config: StationConfig,
}

impl DeviceClient {
    /// Build a client for a station
    ///
    /// The base URL is assembled from scheme, host and port; templated
    /// dialects also carry the station account as URL credentials.
    pub fn new(config: StationConfig) -> Result<Self, ConfigError> {
        let invalid = |key: &'static str, value: String| ConfigError::InvalidValue {
            station: config.name.clone(),
            key,
            value,
        };

        let address = format!("{}://{}", config.scheme, config.host());
        let mut base = Url::parse(&address).map_err(|_| invalid("address", address.clone()))?;
        base.set_port(config.port)
            .map_err(|_| invalid("port", format!("{:?}", config.port)))?;

        if config.dialect.requires_credentials() {
            base.set_username(config.dialect.username())
                .map_err(|_| invalid("address", address.clone()))?;
            if !config.password.is_empty() {
                base.set_password(Some(&config.password))
                    .map_err(|_| invalid("password", "***".to_string()))?;
            }
        }

        let json_url = config
            .json_url
            .as_deref()
            .map(|url| Url::parse(url).map_err(|_| invalid("json_url", url.to_string())))
            .transpose()?;

        let mut metric_urls = HashMap::new();
        for (field, url) in &config.metric_urls {
            let parsed = Url::parse(url).map_err(|_| invalid("metric url", url.to_string()))?;
            metric_urls.insert(*field, parsed);
        }

        Ok(Self {
            http: Client::new(),
            base,
            json_url,
            metric_urls,
            config,
        })
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    fn endpoint(&self, path: &str, query: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(Some(query));
        url
    }

    fn template_url(&self, template: &str) -> Url {
        self.endpoint(TEMPLATE_PATH, &format!("template={}", template))
    }

    /// Request URL of the single template request
    fn single_template_url(&self) -> Url {
        match &self.json_url {
            Some(url) => url.clone(),
            None => self.template_url(&self.config.schema.template()),
        }
    }

    /// Request URL for one field of the multi-request dialect
    fn metric_url(&self, field: Field) -> Url {
        match self.metric_urls.get(&field) {
            Some(url) => url.clone(),
            None => self.template_url(field.token()),
        }
    }

    fn logger_url(&self) -> Url {
        self.endpoint(LOGGER_PATH, LOGGER_QUERY)
    }

    /// GET a URL and return its body, mapping transport failures to `Unreachable`
    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let shown = redact_url(url);
        debug!("Requesting {}", shown);

        let unreachable = |reason: String| FetchError::Unreachable {
            url: shown.clone(),
            reason,
        };

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("response code {}", status)));
        }

        response.text().await.map_err(|e| unreachable(e.to_string()))
    }

    async fn fetch_single_template(&self) -> Result<Reading, FetchError> {
        let url = self.single_template_url();
        let body = self.get_text(&url).await?;
        parser::templated::parse(&body, &self.config.schema).map_err(|source| {
            FetchError::InvalidData {
                url: redact_url(&url),
                source,
            }
        })
    }

    /// One request per field, merged in schema order
    ///
    /// Optional fields that fail are left unset; temperature and humidity
    /// failing fails the whole fetch.
    async fn fetch_multi_template(&self) -> Result<Reading, FetchError> {
        let mut reading = Reading::default();

        for &field in self.config.schema.fields() {
            let url = self.metric_url(field);
            let body = match self.get_text(&url).await {
                Ok(body) => body,
                Err(e) if field.is_mandatory() => return Err(e),
                Err(e) => {
                    debug!("{}: skipping {}: {}", self.config.name, field.name(), e);
                    continue;
                }
            };

            field
                .apply(&mut reading, Some(body.trim()))
                .map_err(|source| FetchError::InvalidData {
                    url: redact_url(&url),
                    source,
                })?;
        }

        Ok(reading)
    }

    async fn fetch_logger(&self) -> Result<Reading, FetchError> {
        let url = self.logger_url();
        let body = self.get_text(&url).await?;
        parser::xml::parse(&body).map_err(|source| FetchError::InvalidData {
            url: redact_url(&url),
            source,
        })
    }

    /// Serial number, platform and firmware from one template request
    async fn template_specifications(&self) -> Result<Specifications, FetchError> {
        let body = self
            .get_text(&self.template_url(SPECIFICATIONS_TEMPLATE))
            .await?;
        let mut parts = body.trim().split(',').map(str::trim);
        let mut specs = Specifications::default();

        if let Some(serial) = parts.next().filter(|s| !s.is_empty()) {
            specs.serial = serial.to_string();
        }
        if let Some(model) = parts.next().filter(|s| !s.is_empty()) {
            specs.model = model.to_string();
        }
        if let Some(version) = parts.next().filter(|s| !s.is_empty()) {
            specs.version = version.to_string();
        }
        Ok(specs)
    }

    /// Platform and version text of a Meteohub, each a separate request
    async fn logger_specifications(&self) -> Specifications {
        let mut specs = Specifications::default();

        match self
            .get_text(&self.endpoint(GRAPH_PATH, "text=actual_system_platform_text"))
            .await
        {
            Ok(model) if !model.trim().is_empty() => specs.model = model.trim().to_string(),
            Ok(_) => warn!("{}: empty platform response, using defaults", self.config.name),
            Err(e) => warn!(
                "{}: unable to determine platform, using defaults: {}",
                self.config.name, e
            ),
        }

        match self
            .get_text(&self.endpoint(GRAPH_PATH, "text=actual_system_version_text"))
            .await
        {
            Ok(version) if !version.trim().is_empty() => {
                specs.version = version.trim().to_string()
            }
            Ok(_) => warn!("{}: empty version response, using defaults", self.config.name),
            Err(e) => warn!(
                "{}: unable to determine software version, using defaults: {}",
                self.config.name, e
            ),
        }

        specs
    }
}

#[async_trait]
impl ReadingSource for DeviceClient {
    async fn fetch_reading(&self) -> Result<Reading, FetchError> {
        let mut reading = match self.config.dialect {
            Dialect::TemplatedSingleMetric => self.fetch_single_template().await?,
            Dialect::TemplatedMultiMetric => self.fetch_multi_template().await?,
            Dialect::XmlFull => self.fetch_logger().await?,
        };
        reading.timestamp = unix_now();
        Ok(reading)
    }

    async fn fetch_specifications(&self) -> Specifications {
        if !self.config.dialect.is_templated() {
            return self.logger_specifications().await;
        }

        match self.template_specifications().await {
            Ok(specs) => specs,
            Err(e) => {
                warn!(
                    "{}: unable to determine MAC address, platform or firmware version, using defaults: {}",
                    self.config.name, e
                );
                Specifications::default()
            }
        }
    }
}
