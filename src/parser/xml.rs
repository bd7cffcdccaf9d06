/// XML logger responses from `/meteolog.cgi?type=xml`
///
/// A response looks like:
///
/// ```text
/// <logger>
///   <TH date="20190419143347" id="th0" temp="18.4" hum="67" dew="12.2" lowbat="0" />
///   <WIND date="20190419143355" id="wind0" dir="65" gust="11.2" wind="8.0" chill="17.2" lowbat="0" />
///   <RAIN date="20190419143305" id="rain0" rate="0.0" total="58.4" delta="0.0" lowbat="0" />
///   <THB date="20190419143335" id="thb0" temp="23.1" hum="74" press="1015.5" lowbat="1" />
/// </logger>
/// ```
///
/// Every attribute arrives as a string and is coerced here.
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

use crate::error::ParseError;
use crate::models::Reading;

use super::{parse_low_battery, parse_number, parse_optional, parse_uv_index};

const ROOT_ELEMENT: &str = "logger";

/// One child of `<logger>`, kept in document order
#[derive(Debug, Default)]
struct SensorElement {
    kind: String,
    id: Option<String>,
    temp: Option<String>,
    hum: Option<String>,
    press: Option<String>,
    wind: Option<String>,
    index: Option<String>,
    lowbat: Option<String>,
}

impl SensorElement {
    fn new(kind: String, attributes: Vec<OwnedAttribute>) -> Self {
        let mut element = SensorElement {
            kind,
            ..Default::default()
        };
        for attribute in attributes {
            let slot = match attribute.name.local_name.as_str() {
                "id" => &mut element.id,
                "temp" => &mut element.temp,
                "hum" => &mut element.hum,
                "press" => &mut element.press,
                "wind" => &mut element.wind,
                "index" => &mut element.index,
                "lowbat" => &mut element.lowbat,
                _ => continue,
            };
            *slot = Some(attribute.value);
        }
        element
    }
}

/// Read the direct children of the `<logger>` root
fn logger_elements(body: &str) -> Result<Vec<SensorElement>, ParseError> {
    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    for event in EventReader::from_str(body) {
        match event.map_err(|e| ParseError::MalformedXml(e.to_string()))? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if !seen_root {
                    if name.local_name != ROOT_ELEMENT {
                        return Err(ParseError::UnexpectedRoot(name.local_name));
                    }
                    seen_root = true;
                } else if depth == 1 {
                    elements.push(SensorElement::new(name.local_name, attributes));
                }
                depth += 1;
            }
            XmlEvent::EndElement { .. } => depth = depth.saturating_sub(1),
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(ParseError::MalformedXml("no root element".to_string()));
    }
    Ok(elements)
}

/// Pick the primary sensor of a kind (`th0`, `thb0`, ...), else the first one
fn primary<'a>(elements: &'a [SensorElement], kind: &str) -> Option<&'a SensorElement> {
    let primary_id = format!("{}0", kind.to_ascii_lowercase());
    let mut of_kind = elements.iter().filter(|e| e.kind == kind);
    let first = of_kind.clone().next();
    of_kind
        .find(|e| e.id.as_deref() == Some(primary_id.as_str()))
        .or(first)
}

/// Decode a Meteohub XML logger document
///
/// Missing `THB`, `WIND` or `UV` elements leave their channels unset. When a
/// station reports several sensors of one kind, the one with id `th0` (`thb0`,
/// `wind0`, `uv0`) is used, matching the templated `[th0...]` tokens.
///
/// # Returns
/// The reading, or `ParseError` if the document has no `<logger>` root or
/// no usable `TH` temperature and humidity
pub fn parse(body: &str) -> Result<Reading, ParseError> {
    let elements = logger_elements(body)?;

    let th = primary(&elements, "TH").ok_or(ParseError::MissingField("TH"))?;
    let temperature = th
        .temp
        .as_deref()
        .ok_or(ParseError::MissingField("temperature"))?;
    let humidity = th
        .hum
        .as_deref()
        .ok_or(ParseError::MissingField("humidity"))?;

    let thb = primary(&elements, "THB");
    let wind = primary(&elements, "WIND");
    let uv = primary(&elements, "UV");

    Ok(Reading {
        temperature: Some(parse_number("temperature", temperature)?),
        humidity: Some(parse_number("humidity", humidity)?),
        pressure: parse_optional("pressure", thb.and_then(|e| e.press.as_deref())),
        uv_index: parse_uv_index(uv.and_then(|e| e.index.as_deref())),
        wind_speed: parse_optional("wind speed", wind.and_then(|e| e.wind.as_deref())),
        low_battery: parse_low_battery(th.lowbat.as_deref()),
        timestamp: 0,
    })
}
