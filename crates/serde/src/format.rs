use std::fmt;
use std::path::Path;
use std::str::FromStr;

use fhirkit::FhirValue;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SerdeError};

/// A FHIR wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhirFormat {
    Json,
    Xml,
}

impl FhirFormat {
    /// Guesses the format from a file extension (`.json`, `.xml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        extension.parse().ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            FhirFormat::Json => "json",
            FhirFormat::Xml => "xml",
        }
    }

    pub fn decode<T>(&self, input: &str) -> Result<T>
    where
        T: FhirValue + DeserializeOwned,
    {
        match self {
            FhirFormat::Json => crate::json::from_json_str(input),
            #[cfg(feature = "xml")]
            FhirFormat::Xml => crate::xml::from_xml_str(input),
            #[cfg(not(feature = "xml"))]
            FhirFormat::Xml => Err(xml_disabled()),
        }
    }

    pub fn encode<T>(&self, value: &T, pretty: bool) -> Result<String>
    where
        T: FhirValue + Serialize,
    {
        match self {
            FhirFormat::Json if pretty => crate::json::to_json_string_pretty(value),
            FhirFormat::Json => crate::json::to_json_string(value),
            #[cfg(feature = "xml")]
            FhirFormat::Xml => crate::xml::to_xml_string_with(
                value,
                &crate::xml::XmlConfig {
                    pretty,
                    ..Default::default()
                },
            ),
            #[cfg(not(feature = "xml"))]
            FhirFormat::Xml => Err(xml_disabled()),
        }
    }
}

#[cfg(not(feature = "xml"))]
fn xml_disabled() -> SerdeError {
    SerdeError::Custom("XML support requires the `xml` feature".to_string())
}

impl fmt::Display for FhirFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FhirFormat {
    type Err = SerdeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "application/fhir+json" => Ok(FhirFormat::Json),
            "xml" | "application/fhir+xml" => Ok(FhirFormat::Xml),
            other => Err(SerdeError::Custom(format!("unknown format `{}`", other))),
        }
    }
}
