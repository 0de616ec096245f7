//! Serde building blocks for the FHIR JSON representation.
//!
//! FHIR JSON splits a primitive into two sibling properties: the value under
//! `name` and its metadata (`id`, `extension`) under `_name`. The helpers here
//! cover both halves without knowing anything about the model that uses them.

use serde::de::{self, Deserialize, Deserializer, Unexpected};
use serde::ser::{self, Serialize, Serializer};
use serde_json::value::RawValue;

/// Splits a JSON property name into its metadata flag and logical name.
///
/// `_birthDate` yields `(true, "birthDate")`, `birthDate` yields
/// `(false, "birthDate")`.
pub fn split_metadata_key(key: &str) -> (bool, &str) {
    match key.strip_prefix('_') {
        Some(name) => (true, name),
        None => (false, key),
    }
}

fn is_empty_slice<E>(items: &&[E]) -> bool {
    items.is_empty()
}

/// Helper struct for serializing id and extension metadata for FHIR primitives.
///
/// This helper writes only the `_name` half of a primitive; the value itself
/// is serialized separately under `name`.
///
/// # Example
/// ```json
/// {
///   "status": "active",
///   "_status": {
///     "id": "status-1",
///     "extension": [...]
///   }
/// }
/// ```
#[derive(serde::Serialize)]
pub struct IdAndExtensionHelper<'a, E> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub extension: &'a [E],
}

impl<E> IdAndExtensionHelper<'_, E> {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.extension.is_empty()
    }
}

/// A single JSON scalar token, kept in its source form.
///
/// Numbers stay textual so decimal precision (`1.50`) survives until the
/// model decides how to interpret them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JsonPrimitive {
    Null,
    Bool(bool),
    Number(String),
    String(String),
}

impl JsonPrimitive {
    /// JSON kind of the token, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            JsonPrimitive::Null => "null",
            JsonPrimitive::Bool(_) => "boolean",
            JsonPrimitive::Number(_) => "number",
            JsonPrimitive::String(_) => "string",
        }
    }
}

impl JsonPrimitive {
    /// Classifies an already-read JSON value; objects and arrays are
    /// reported as `invalid_type` against `expected`.
    pub fn from_raw<E>(raw: &RawValue, expected: &dyn de::Expected) -> Result<Self, E>
    where
        E: de::Error,
    {
        let text = raw.get().trim();
        match text.as_bytes().first() {
            Some(b'{') => Err(E::invalid_type(Unexpected::Map, expected)),
            Some(b'[') => Err(E::invalid_type(Unexpected::Seq, expected)),
            Some(b'"') => serde_json::from_str::<String>(text)
                .map(JsonPrimitive::String)
                .map_err(E::custom),
            _ => match text {
                "null" => Ok(JsonPrimitive::Null),
                "true" => Ok(JsonPrimitive::Bool(true)),
                "false" => Ok(JsonPrimitive::Bool(false)),
                number => Ok(JsonPrimitive::Number(number.to_string())),
            },
        }
    }
}

impl<'de> Deserialize<'de> for JsonPrimitive {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(&raw, &"a primitive value")
    }
}

/// Writes pre-formatted number text verbatim, e.g. a decimal's `1.50`.
pub struct RawNumber<'a>(pub &'a str);

impl Serialize for RawNumber<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let raw = RawValue::from_string(self.0.to_string()).map_err(ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Ext {
        url: String,
    }

    #[test]
    fn test_split_metadata_key() {
        assert_eq!(split_metadata_key("_birthDate"), (true, "birthDate"));
        assert_eq!(split_metadata_key("birthDate"), (false, "birthDate"));
    }

    #[test]
    fn test_helper_skips_empty_parts() {
        let extensions: Vec<Ext> = Vec::new();
        let helper = IdAndExtensionHelper {
            id: Some("a1"),
            extension: &extensions,
        };
        assert_eq!(serde_json::to_string(&helper).unwrap(), r#"{"id":"a1"}"#);

        let extensions = vec![Ext {
            url: "http://example.org".to_string(),
        }];
        let helper = IdAndExtensionHelper {
            id: None,
            extension: &extensions,
        };
        assert_eq!(
            serde_json::to_string(&helper).unwrap(),
            r#"{"extension":[{"url":"http://example.org"}]}"#
        );
    }

    #[test]
    fn test_json_primitive_keeps_number_text() {
        let values: Vec<JsonPrimitive> =
            serde_json::from_str(r#"[1.50, true, "a\"b", null, -3]"#).unwrap();
        assert_eq!(
            values,
            vec![
                JsonPrimitive::Number("1.50".to_string()),
                JsonPrimitive::Bool(true),
                JsonPrimitive::String("a\"b".to_string()),
                JsonPrimitive::Null,
                JsonPrimitive::Number("-3".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_primitive_rejects_containers() {
        let err = serde_json::from_str::<JsonPrimitive>(r#"{"a":1}"#).unwrap_err();
        assert!(err.to_string().contains("expected a primitive value"));
        assert!(serde_json::from_str::<JsonPrimitive>("[1]").is_err());
    }

    #[test]
    fn test_from_raw_names_the_expected_value() {
        let raw = serde_json::from_str::<Box<RawValue>>(r#"{"a":1}"#).unwrap();
        let err = JsonPrimitive::from_raw::<serde_json::Error>(&raw, &"a date value for `created`")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid type: map, expected a date value for `created`"
        );

        let raw = serde_json::from_str::<Box<RawValue>>(" 1.5e2").unwrap();
        assert_eq!(
            JsonPrimitive::from_raw::<serde_json::Error>(&raw, &"a number").unwrap(),
            JsonPrimitive::Number("1.5e2".to_string())
        );
    }

    #[test]
    fn test_raw_number_is_written_verbatim() {
        assert_eq!(serde_json::to_string(&RawNumber("1.50")).unwrap(), "1.50");
        assert!(serde_json::to_string(&RawNumber("not a number")).is_err());
    }
}
