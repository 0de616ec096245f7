//! JSON wrapper functions for FHIR values.
//!
//! The FHIR JSON rules themselves live in the derived `serde` impls of the
//! model types. These wrappers add what a caller of a codec expects on top:
//! encoding invariants are checked before anything is written, and decode
//! errors are classified as [`SerdeError::Structural`] with their position.
use std::io;

use fhirkit::{FhirValue, check_encodable};
use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};

use crate::error::{Result, SerdeError};

fn check<T: FhirValue>(value: &T) -> Result<()> {
    check_encodable(value.as_value())?;
    Ok(())
}

/// Deserialize a FHIR value from a JSON string.
///
/// # Examples
///
/// ```ignore
/// use fhirkit_serde::json::from_json_str;
/// use fhirkit::SubstanceDefinition;
///
/// let json = r#"{"resourceType": "SubstanceDefinition", "id": "example"}"#;
/// let substance: SubstanceDefinition = from_json_str(json)?;
/// ```
pub fn from_json_str<'a, T>(s: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    tracing::debug!(format = "json", bytes = s.len(), "decoding");
    serde_json::from_str(s).map_err(SerdeError::from_json_decode)
}

/// Deserialize a FHIR value from a JSON byte slice.
///
/// # Examples
///
/// ```ignore
/// use fhirkit_serde::json::from_json_slice;
/// use fhirkit::Resource;
///
/// let json_bytes = br#"{"resourceType": "Basic", "code": {"text": "x"}}"#;
/// let resource: Resource = from_json_slice(json_bytes)?;
/// ```
pub fn from_json_slice<'a, T>(v: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    tracing::debug!(format = "json", bytes = v.len(), "decoding");
    serde_json::from_slice(v).map_err(SerdeError::from_json_decode)
}

/// Deserialize a FHIR value from a reader.
pub fn from_json_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    serde_json::from_reader(reader).map_err(SerdeError::from_json_decode)
}

/// Deserialize a FHIR value from a `serde_json::Value`.
///
/// The value is re-read as text so that contained resources, which are
/// dispatched on `resourceType`, decode the same way as from a string.
pub fn from_json_value<T>(value: serde_json::Value) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = serde_json::to_string(&value)?;
    serde_json::from_str(&text).map_err(SerdeError::from_json_decode)
}

/// Serialize a FHIR value to a JSON string.
///
/// # Examples
///
/// ```ignore
/// use fhirkit_serde::json::to_json_string;
/// use fhirkit::{Basic, CodeableConcept};
///
/// let basic = Basic { code: CodeableConcept::text("x"), ..Default::default() };
/// let json = to_json_string(&basic)?;
/// ```
pub fn to_json_string<T>(value: &T) -> Result<String>
where
    T: FhirValue + Serialize,
{
    check(value)?;
    let json = serde_json::to_string(value)?;
    tracing::debug!(format = "json", bytes = json.len(), "encoded");
    Ok(json)
}

/// Serialize a FHIR value to a pretty-printed JSON string.
pub fn to_json_string_pretty<T>(value: &T) -> Result<String>
where
    T: FhirValue + Serialize,
{
    check(value)?;
    Ok(serde_json::to_string_pretty(value)?)
}

/// Serialize a FHIR value to a JSON byte vector.
pub fn to_json_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: FhirValue + Serialize,
{
    check(value)?;
    Ok(serde_json::to_vec(value)?)
}

/// Serialize a FHIR value into a writer.
pub fn to_json_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: FhirValue + Serialize,
{
    check(value)?;
    Ok(serde_json::to_writer(writer, value)?)
}

/// Serialize a FHIR value to a `serde_json::Value`.
pub fn to_json_value<T>(value: &T) -> Result<serde_json::Value>
where
    T: FhirValue + Serialize,
{
    check(value)?;
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirkit::{Basic, CodeableConcept, Resource};

    #[test]
    fn test_invariants_are_checked_before_writing() {
        let mut out = Vec::new();
        let err = to_json_writer(&mut out, &Basic::default()).unwrap_err();
        assert!(err.is_invariant());
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_errors_are_structural() {
        let err = from_json_str::<Basic>(r#"{"resourceType":"Basic","bogus":true}"#).unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("unknown field `bogus` in Basic"));
    }

    #[test]
    fn test_from_value_dispatches_contained() {
        let value = serde_json::json!({
            "resourceType": "Basic",
            "code": {"text": "outer"},
            "contained": [{"resourceType": "Basic", "code": {"text": "inner"}}]
        });
        let resource: Resource = from_json_value(value).unwrap();
        let Resource::Basic(basic) = resource else {
            panic!("expected Basic");
        };
        assert_eq!(basic.code, CodeableConcept::text("outer"));
        assert_eq!(basic.contained[0].resource_type(), "Basic");
    }
}
