//! XML serialization and deserialization for FHIR resources.
//!
//! Both directions walk the element tree through its type descriptors, the
//! same way the JSON engine in `fhirkit::json` does, and stream quick-xml
//! events directly. No JSON intermediate is built.
//!
//! - **Serialization** ([`ser`]): for each field in declaration order,
//!   attribute fields become XML attributes, primitives become
//!   `<name id=".." value="..">` with extension children, composites become
//!   nested elements and contained resources are wrapped in an element named
//!   after the field.
//!
//! - **Deserialization** ([`de`]): child element names are resolved against
//!   the descriptor (`valueQuantity` selects the `Quantity` member of
//!   `value[x]`) and the tree is filled through the model's slots.
//!
//! ## FHIR JSON ↔ XML Mapping
//!
//! ### Primitives with Extensions
//!
//! **JSON Pattern**:
//! ```json
//! {
//!   "version": "1.0",
//!   "_version": {
//!     "id": "v1",
//!     "extension": [...]
//!   }
//! }
//! ```
//!
//! **XML Pattern**:
//! ```xml
//! <version id="v1" value="1.0">
//!   <extension url="...">...</extension>
//! </version>
//! ```
//!
//! ### Arrays with Extensions
//!
//! **JSON Pattern**:
//! ```json
//! {
//!   "profile": ["http://example.org/a", null],
//!   "_profile": [null, {"id": "p2"}]
//! }
//! ```
//!
//! **XML Pattern**:
//! ```xml
//! <profile value="http://example.org/a"/>
//! <profile id="p2"/>
//! ```
//!
//! ### Contained Resources
//!
//! **JSON Pattern**:
//! ```json
//! { "contained": [{ "resourceType": "Basic", "id": "b1" }] }
//! ```
//!
//! **XML Pattern**:
//! ```xml
//! <contained>
//!   <Basic>
//!     <id value="b1"/>
//!   </Basic>
//! </contained>
//! ```
//!
//! ## Special Attributes
//!
//! Only these attributes are accepted; any other is a structural error:
//!
//! - **`value`**: the value of a primitive
//! - **`id`**: the element id of a primitive or a datatype (a resource id is
//!   a child element)
//! - **`url`**: `Extension.url`
//! - **`xmlns`**, **`xmlns:*`**: namespace declarations
//!
//! ## Namespace Handling
//!
//! - The FHIR namespace (`http://hl7.org/fhir`) is written on the root
//!   element only; a different default namespace on input is rejected
//! - `<div>` narrative content keeps its XHTML namespace and is copied
//!   event by event
//!
//! ## Examples
//!
//! ```ignore
//! use fhirkit_serde::xml::{from_xml_str, to_xml_string};
//! use fhirkit::Resource;
//!
//! let resource: Resource = from_xml_str(xml)?;
//! let xml = to_xml_string(&resource)?;
//! ```

pub mod de;
pub mod ser;
pub mod utils;

pub use de::{from_xml_reader, from_xml_slice, from_xml_str};
pub use ser::{XmlConfig, to_xml_string, to_xml_string_with, to_xml_vec, to_xml_writer};
pub use utils::FHIR_NAMESPACE;
