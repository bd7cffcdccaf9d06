/// Station response dialects and their request shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// One template request returning every configured field
    #[default]
    TemplatedSingleMetric,
    /// One template request per field, merged into one reading
    TemplatedMultiMetric,
    /// The XML logger document of a Meteohub
    XmlFull,
}

impl Dialect {
    /// Parse the `type` configuration value
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "meteobridge" | "template" | "templated" => Some(Dialect::TemplatedSingleMetric),
            "meteobridge-multi" | "multi" | "templated-multi" => {
                Some(Dialect::TemplatedMultiMetric)
            }
            "meteohub" | "xml" => Some(Dialect::XmlFull),
            _ => None,
        }
    }

    /// Fixed account name the station firmware expects
    pub fn username(self) -> &'static str {
        match self {
            Dialect::TemplatedSingleMetric | Dialect::TemplatedMultiMetric => "meteobridge",
            Dialect::XmlFull => "meteohub",
        }
    }

    /// Whether requests carry basic-auth credentials in the URL
    pub fn requires_credentials(self) -> bool {
        !matches!(self, Dialect::XmlFull)
    }

    pub fn is_templated(self) -> bool {
        !matches!(self, Dialect::XmlFull)
    }
}
