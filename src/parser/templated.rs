/// Comma-delimited template responses from `/cgi-bin/template.cgi`
use crate::error::ParseError;
use crate::models::Reading;

use super::{parse_low_battery, parse_number, parse_optional, parse_uv_index};

/// A value that can be requested through a station template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    UvIndex,
    WindSpeed,
    LowBattery,
}

impl Field {
    /// Template token asking the station for the current value
    pub fn token(self) -> &'static str {
        match self {
            Field::Temperature => "[th0temp-act]",
            Field::Humidity => "[th0hum-act]",
            Field::Pressure => "[thb0press-act]",
            Field::UvIndex => "[uv0index-act]",
            Field::WindSpeed => "[wind0wind-act]",
            Field::LowBattery => "[th0lowbat-act]",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::UvIndex => "uv index",
            Field::WindSpeed => "wind speed",
            Field::LowBattery => "low battery",
        }
    }

    /// Parse a configuration name such as `pressure` or `lowbat`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Some(Field::Temperature),
            "humidity" | "hum" => Some(Field::Humidity),
            "pressure" | "press" => Some(Field::Pressure),
            "uv" | "uv_index" | "uvindex" => Some(Field::UvIndex),
            "wind" | "wind_speed" | "windspeed" => Some(Field::WindSpeed),
            "lowbat" | "low_battery" | "battery" => Some(Field::LowBattery),
            _ => None,
        }
    }

    pub fn is_mandatory(self) -> bool {
        matches!(self, Field::Temperature | Field::Humidity)
    }

    /// Store a raw value into the reading
    ///
    /// Mandatory fields must be numeric. Optional fields that do not parse
    /// are left unset.
    pub(crate) fn apply(self, reading: &mut Reading, raw: Option<&str>) -> Result<(), ParseError> {
        match self {
            Field::Temperature => reading.temperature = Some(mandatory(self, raw)?),
            Field::Humidity => reading.humidity = Some(mandatory(self, raw)?),
            Field::Pressure => reading.pressure = parse_optional(self.name(), raw),
            Field::UvIndex => reading.uv_index = parse_uv_index(raw),
            Field::WindSpeed => reading.wind_speed = parse_optional(self.name(), raw),
            Field::LowBattery => reading.low_battery = parse_low_battery(raw),
        }
        Ok(())
    }
}

fn mandatory(field: Field, raw: Option<&str>) -> Result<f32, ParseError> {
    let raw = raw.ok_or(ParseError::MissingField(field.name()))?;
    parse_number(field.name(), raw)
}

/// Ordered list of fields a station returns for one template request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSchema {
    fields: Vec<Field>,
}

impl TemplateSchema {
    /// Returns `None` unless the list contains both temperature and humidity
    pub fn new(fields: Vec<Field>) -> Option<Self> {
        let has_mandatory = fields.contains(&Field::Temperature) && fields.contains(&Field::Humidity);
        has_mandatory.then_some(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Query value for `template=`, e.g. `[th0temp-act],[th0hum-act]`
    pub fn template(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.token())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for TemplateSchema {
    /// Temperature, humidity and the low battery flag of the first sensor
    fn default() -> Self {
        Self {
            fields: vec![Field::Temperature, Field::Humidity, Field::LowBattery],
        }
    }
}

/// Decode a comma-joined template response in schema order
///
/// # Arguments
/// * `body` - Raw response body, e.g. `21.5,48,0`
/// * `schema` - Field order the template was requested with
///
/// # Returns
/// The reading, or `ParseError` if temperature or humidity is unusable
pub fn parse(body: &str, schema: &TemplateSchema) -> Result<Reading, ParseError> {
    let values: Vec<&str> = body.trim().split(',').map(str::trim).collect();
    let mut reading = Reading::default();

    for (index, field) in schema.fields().iter().enumerate() {
        field.apply(&mut reading, values.get(index).copied())?;
    }

    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_schema() -> TemplateSchema {
        TemplateSchema::new(vec![
            Field::Temperature,
            Field::Humidity,
            Field::Pressure,
            Field::UvIndex,
            Field::WindSpeed,
            Field::LowBattery,
        ])
        .unwrap()
    }

    #[test]
    fn parses_temperature_humidity_and_battery() {
        let reading = parse("21.5,48,0", &TemplateSchema::default()).unwrap();

        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.humidity, Some(48.0));
        assert_eq!(reading.low_battery, Some(false));
        assert_eq!(reading.pressure, None);
    }

    #[test]
    fn nan_temperature_is_rejected() {
        let err = parse("NaN,48", &TemplateSchema::default()).unwrap_err();
        assert!(matches!(err, ParseError::NotANumber { field: "temperature", .. }));
    }

    #[test]
    fn non_numeric_humidity_is_rejected() {
        let err = parse("21.5,--,0", &TemplateSchema::default()).unwrap_err();
        assert!(matches!(err, ParseError::NotANumber { field: "humidity", .. }));
    }

    #[test]
    fn short_body_misses_mandatory_field() {
        let err = parse("21.5", &TemplateSchema::default()).unwrap_err();
        assert_eq!(err, ParseError::MissingField("humidity"));
    }

    #[test]
    fn bad_optional_fields_are_left_unset() {
        let reading = parse("18.0,60,--,3,,1", &full_schema()).unwrap();

        assert_eq!(reading.temperature, Some(18.0));
        assert_eq!(reading.pressure, None);
        assert_eq!(reading.uv_index, Some(3));
        assert_eq!(reading.wind_speed, None);
        assert_eq!(reading.low_battery, Some(true));
    }

    #[test]
    fn full_schema_response() {
        let reading = parse("12.3, 81, 1013.2, 2, 4.5, 0\n", &full_schema()).unwrap();

        assert_eq!(reading.pressure, Some(1013.2));
        assert_eq!(reading.uv_index, Some(2));
        assert_eq!(reading.wind_speed, Some(4.5));
        assert_eq!(reading.low_battery, Some(false));
    }

    #[test]
    fn parsing_is_deterministic() {
        let body = "12.3,81,1013.2,2,4.5,0";
        assert_eq!(parse(body, &full_schema()), parse(body, &full_schema()));
    }

    #[test]
    fn field_order_follows_schema() {
        let schema = TemplateSchema::new(vec![Field::Humidity, Field::Temperature]).unwrap();
        let reading = parse("55,19.5", &schema).unwrap();

        assert_eq!(reading.humidity, Some(55.0));
        assert_eq!(reading.temperature, Some(19.5));
    }

    #[test]
    fn schema_requires_mandatory_fields() {
        assert!(TemplateSchema::new(vec![Field::Temperature, Field::Pressure]).is_none());
        assert_eq!(
            TemplateSchema::default().template(),
            "[th0temp-act],[th0hum-act],[th0lowbat-act]"
        );
    }

    #[test]
    fn field_names_from_configuration() {
        assert_eq!(Field::from_name("Pressure"), Some(Field::Pressure));
        assert_eq!(Field::from_name(" lowbat "), Some(Field::LowBattery));
        assert_eq!(Field::from_name("rain"), None);
    }
}
