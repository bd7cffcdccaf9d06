/// Decoders for the two station response formats
///
/// Both decoders are pure functions of the response body. They leave the
/// reading's timestamp at 0; the device client stamps it at capture time.
pub mod templated;
pub mod xml;

pub use templated::{Field, TemplateSchema};

use crate::error::ParseError;

/// Parse a numeric value, rejecting text and non-finite values such as `NaN`
pub(crate) fn parse_number(field: &'static str, raw: &str) -> Result<f32, ParseError> {
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::NotANumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Parse an optional numeric value; anything unparseable counts as absent
pub(crate) fn parse_optional(field: &'static str, raw: Option<&str>) -> Option<f32> {
    raw.and_then(|raw| parse_number(field, raw).ok())
}

/// UV index is reported as a float but published as an integer in 0..=10
pub(crate) fn parse_uv_index(raw: Option<&str>) -> Option<u8> {
    parse_optional("uv index", raw).map(|uv| uv.round().clamp(0.0, 10.0) as u8)
}

/// Low battery flags are integers, 0 for ok and anything else for low
pub(crate) fn parse_low_battery(raw: Option<&str>) -> Option<bool> {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok()).map(|flag| flag != 0)
}
