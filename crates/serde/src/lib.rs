//! # fhirkit-serde
//!
//! Format-level entry points for the fhirkit element model.
//!
//! ## Features
//!
//! - **JSON Support**: Thin wrappers around `serde_json` that run the derived
//!   FHIR JSON impls, check encoding invariants up front and classify decode
//!   errors.
//! - **XML Support** (`xml` feature, on by default): a writer and a reader
//!   that walk the element tree through its type descriptors and stream
//!   quick-xml events directly, without a JSON intermediate.
//!
//! ## FHIR JSON ↔ XML Mapping
//!
//! | JSON Pattern | XML Pattern |
//! |--------------|-------------|
//! | `{"active": true}` | `<active value="true"/>` |
//! | `{"birthDate": "1974-12-25", "_birthDate": {"id": "123"}}` | `<birthDate id="123" value="1974-12-25"/>` |
//! | `{"given": ["John", "Doe"]}` | `<given value="John"/><given value="Doe"/>` |
//! | `{"given": ["A", null], "_given": [null, {"id": "123"}]}` | `<given value="A"/><given id="123"/>` |
//! | `{"contained": [{"resourceType": "Basic"}]}` | `<contained><Basic/></contained>` |
//!
//! ## Examples
//!
//! ```ignore
//! use fhirkit::Resource;
//! use fhirkit_serde::{FhirFormat, from_json_str, to_xml_string};
//!
//! let resource: Resource = from_json_str(json)?;
//! let xml = to_xml_string(&resource)?;
//! let back: Resource = FhirFormat::Xml.decode(&xml)?;
//! ```

pub mod error;
pub mod format;
pub mod json;

#[cfg(feature = "xml")]
pub mod xml;

pub use error::{Location, Result, SerdeError, StructuralError};
pub use format::FhirFormat;

pub use json::{
    from_json_reader, from_json_slice, from_json_str, from_json_value, to_json_string,
    to_json_string_pretty, to_json_value, to_json_vec, to_json_writer,
};

#[cfg(feature = "xml")]
pub use xml::{
    XmlConfig, from_xml_reader, from_xml_slice, from_xml_str, to_xml_string, to_xml_string_with,
    to_xml_vec, to_xml_writer,
};
