//! # fhirkit
//!
//! A generic FHIR element model.
//!
//! Every model type is a plain Rust struct or enum that derives
//! [`FhirElement`] or [`FhirChoice`]. The derives emit one `'static`
//! [`TypeDescriptor`] per type plus index-addressed field accessors; a single
//! generic engine then handles, for all types:
//!
//! - FHIR JSON, through the derived `serde` impls (see [`json`])
//! - reflective traversal for FHIRPath evaluators (see [`traversal`])
//! - pre-encode structural checks (see [`validate`])
//!
//! ## Model conventions
//!
//! | FHIR | Rust |
//! |------|------|
//! | `0..1` | `Option<T>` |
//! | `1..1` | `T` |
//! | `0..*` | `Vec<T>` |
//! | `name[x]` | `Option<Enum>` with one variant per allowed type |
//! | primitive `T` | [`Primitive<V>`]: value, `id` and `extension`, each optional |
//! | any resource | [`Resource`] |
//!
//! ```ignore
//! use fhirkit::{SubstanceDefinition, CodeableConcept};
//!
//! let substance: SubstanceDefinition = serde_json::from_str(
//!     r#"{"resourceType":"SubstanceDefinition","status":{"text":"active"}}"#,
//! )?;
//! assert_eq!(substance.status, Some(CodeableConcept::text("active")));
//! ```

extern crate self as fhirkit;

pub mod datatypes;
pub mod descriptor;
pub mod element;
pub mod json;
pub mod primitives;
pub mod registry;
pub mod resources;
pub mod traversal;
pub mod validate;

pub use datatypes::*;
pub use descriptor::{Cardinality, FieldDescriptor, TypeDescriptor, ValueKind, WireField};
pub use element::{
    AttributeSlot, Element, Emptiness, FhirType, FhirValue, FieldMut, FieldRef, OptionalSlot,
    RepeatedSlot, RequiredSlot, StaticDescriptor, ValueMut, ValueRef,
};
pub use primitives::{
    Base64Binary, Boolean, Canonical, Code, Date, DateTime, Decimal, FhirString, Id, Instant,
    Integer, Markdown, PositiveInt, PreciseDecimal, Primitive, PrimitiveElement, PrimitiveError,
    PrimitiveValue, Scalar, Time, UnsignedInt, Uri, Url, Xhtml,
};
pub use resources::*;
pub use traversal::Child;
pub use validate::{InvariantViolation, check_encodable};

pub use fhirkit_fhirpath_support::{
    ClassInfo, ClassInfoElement, ConversionError, EvaluationResult, QuantityValue, TypeInfoResult,
};
pub use fhirkit_macro::{FhirChoice, FhirElement};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
