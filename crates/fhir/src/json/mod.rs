//! The FHIR JSON engine behind every derived `Serialize`/`Deserialize` impl.
//!
//! One generic implementation, driven by the [`TypeDescriptor`] of each
//! element, handles the JSON conventions:
//!
//! | Model | JSON |
//! |-------|------|
//! | primitive value and metadata | `"x": v` and `"_x": {"id": .., "extension": [..]}` |
//! | repeated primitives | `"x": [v, null]` and `"_x": [null, {..}]`, index-aligned |
//! | choice field `value[x]` holding a `Quantity` | `"valueQuantity": {..}` |
//! | resource | `"resourceType"` first, then fields in declaration order |
//!
//! Empty optional and repeated fields are omitted. Decoding is strict: an
//! unknown property or a second value for a single-valued field is an error.
//!
//! [`TypeDescriptor`]: crate::TypeDescriptor

mod de;
mod ser;

pub use de::{deserialize_element, deserialize_resource};
pub use ser::{serialize_element, serialize_value};
