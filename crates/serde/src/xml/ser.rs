//! XML serialization.
//!
//! The writer walks the element tree through [`Element::field`] and the type
//! descriptors, writing quick-xml events as it goes. Field order is
//! declaration order, the same order the JSON engine uses.

use std::io::Write;

use fhirkit::{
    Element, Emptiness, FhirValue, FieldDescriptor, FieldRef, PrimitiveElement, ValueKind,
    ValueRef, check_encodable,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, SerdeError};
use crate::xml::utils;

/// Output options for the XML writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlConfig {
    /// Indent nested elements by two spaces.
    pub pretty: bool,
    /// Start the document with `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            declaration: true,
        }
    }
}

/// Serialize a FHIR resource to an XML string.
///
/// # Examples
///
/// ```ignore
/// use fhirkit_serde::xml::to_xml_string;
/// use fhirkit::{Basic, CodeableConcept};
///
/// let basic = Basic { code: CodeableConcept::text("x"), ..Default::default() };
/// let xml = to_xml_string(&basic)?;
/// ```
pub fn to_xml_string<T>(value: &T) -> Result<String>
where
    T: FhirValue,
{
    to_xml_string_with(value, &XmlConfig::default())
}

/// Serialize a FHIR resource to an XML string with explicit output options.
pub fn to_xml_string_with<T>(value: &T, config: &XmlConfig) -> Result<String>
where
    T: FhirValue,
{
    let mut buffer = Vec::new();
    to_xml_writer(value, &mut buffer, config)?;
    let xml = String::from_utf8(buffer).map_err(|e| SerdeError::Custom(e.to_string()))?;
    tracing::debug!(format = "xml", bytes = xml.len(), "encoded");
    Ok(xml)
}

/// Serialize a FHIR resource to an XML byte vector.
pub fn to_xml_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: FhirValue,
{
    let mut buffer = Vec::new();
    to_xml_writer(value, &mut buffer, &XmlConfig::default())?;
    Ok(buffer)
}

/// Serialize a FHIR resource to an XML writer.
///
/// Encoding invariants are checked first; nothing is written if they fail.
pub fn to_xml_writer<T, W>(value: &T, writer: W, config: &XmlConfig) -> Result<()>
where
    T: FhirValue,
    W: Write,
{
    let root = value.as_value();
    check_encodable(root)?;
    let ValueRef::Element(element) = root else {
        return Err(not_a_resource(root.type_name()));
    };
    if element.descriptor().kind != ValueKind::Resource {
        return Err(not_a_resource(root.type_name()));
    }

    let mut serializer = XmlSerializer::new(writer, config.pretty);
    if config.declaration {
        serializer.write_xml_declaration()?;
    }
    serializer.write_resource(element, &Emptiness::of(root), true)
}

fn not_a_resource(type_name: &str) -> SerdeError {
    SerdeError::Custom(format!(
        "only resources can be written as an XML document, found {}",
        type_name
    ))
}

struct XmlSerializer<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlSerializer<W> {
    fn new(writer: W, pretty: bool) -> Self {
        let writer = if pretty {
            Writer::new_with_indent(writer, b' ', 2)
        } else {
            Writer::new(writer)
        };
        Self { writer }
    }

    fn write_xml_declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    /// Writes `<Type>...</Type>`; only the document root carries the namespace.
    fn write_resource(
        &mut self,
        resource: &dyn Element,
        emptiness: &Emptiness,
        root: bool,
    ) -> Result<()> {
        let name = resource.descriptor().name;
        let mut start = BytesStart::new(name);
        if root {
            start.push_attribute(("xmlns", utils::FHIR_NAMESPACE));
        }
        self.write_composite(start, name, resource, emptiness)
    }

    fn write_composite(
        &mut self,
        mut start: BytesStart<'_>,
        tag: &str,
        element: &dyn Element,
        emptiness: &Emptiness,
    ) -> Result<()> {
        let descriptor = element.descriptor();
        let mut children: Vec<(&'static FieldDescriptor, ValueRef<'_>, &Emptiness)> = Vec::new();

        for (index, field) in descriptor.fields.iter().enumerate() {
            match element.field(index) {
                FieldRef::Attribute(Some(value)) if !value.is_empty() => {
                    start.push_attribute((field.name, value));
                }
                FieldRef::Attribute(_) => {}
                values => children.extend(
                    values
                        .values()
                        .into_iter()
                        .zip(emptiness.field(index))
                        .filter(|(_, emptiness)| !emptiness.is_empty())
                        .map(|(value, emptiness)| (field, value, emptiness)),
                ),
            }
        }

        if children.is_empty() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        for (field, value, emptiness) in children {
            self.write_field(field, value, emptiness)?;
        }
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// Writes one populated value of a field.
    fn write_field(
        &mut self,
        field: &FieldDescriptor,
        value: ValueRef<'_>,
        emptiness: &Emptiness,
    ) -> Result<()> {
        let name = field.wire_name(value.type_name());
        match value {
            ValueRef::Primitive(primitive) if primitive.type_name() == utils::XHTML_TYPE => {
                self.write_div_element(primitive)
            }
            ValueRef::Primitive(primitive) => self.write_primitive(&name, primitive),
            ValueRef::Element(element) if element.descriptor().kind == ValueKind::Resource => {
                self.writer
                    .write_event(Event::Start(BytesStart::new(&*name)))?;
                self.write_resource(element, emptiness, false)?;
                self.writer
                    .write_event(Event::End(BytesEnd::new(&*name)))?;
                Ok(())
            }
            ValueRef::Element(element) => {
                self.write_composite(BytesStart::new(&*name), &name, element, emptiness)
            }
            ValueRef::System(text) => {
                let mut start = BytesStart::new(&*name);
                start.push_attribute(("value", text));
                self.writer.write_event(Event::Empty(start))?;
                Ok(())
            }
        }
    }

    /// `<name id=".." value="..">` followed by any extensions.
    fn write_primitive(&mut self, name: &str, primitive: &dyn PrimitiveElement) -> Result<()> {
        let mut start = BytesStart::new(name);
        if let Some(id) = primitive.id() {
            start.push_attribute(("id", id));
        }
        if let Some(scalar) = primitive.scalar() {
            let text = scalar.to_text();
            start.push_attribute(("value", &*text));
        }

        let extensions = primitive.extension();
        if extensions.is_empty() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        for extension in extensions {
            let emptiness = Emptiness::of(ValueRef::Element(extension));
            self.write_composite(BytesStart::new("extension"), "extension", extension, &emptiness)?;
        }
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Copies narrative XHTML into the output event by event.
    fn write_div_element(&mut self, primitive: &dyn PrimitiveElement) -> Result<()> {
        let Some(scalar) = primitive.scalar() else {
            return Ok(());
        };
        let content = scalar.to_text();
        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(false);

        let mut root = true;
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(start)) if root => {
                    root = false;
                    self.writer.write_event(Event::Start(with_xhtml_namespace(start)))?;
                }
                Ok(Event::Empty(start)) if root => {
                    root = false;
                    self.writer.write_event(Event::Empty(with_xhtml_namespace(start)))?;
                }
                Ok(event) => self.writer.write_event(event)?,
                Err(e) => {
                    return Err(SerdeError::Custom(format!(
                        "Failed to parse XHTML div content: {}",
                        e
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Adds the XHTML default namespace to a narrative root that lacks one.
fn with_xhtml_namespace(mut start: BytesStart<'_>) -> BytesStart<'_> {
    let declared = start
        .attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"xmlns");
    if !declared {
        start.push_attribute(("xmlns", utils::XHTML_NAMESPACE));
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirkit::{Basic, CodeableConcept, Coding, FhirString};

    fn basic() -> Basic {
        Basic {
            code: CodeableConcept {
                coding: vec![Coding {
                    system: Some(fhirkit::Uri::parse("http://example.org/codes").unwrap()),
                    code: Some(fhirkit::Code::parse("note").unwrap()),
                    ..Default::default()
                }],
                text: Some(FhirString::from("a & b")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_compact_document() -> Result<()> {
        let xml = to_xml_string(&basic())?;
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<Basic xmlns="http://hl7.org/fhir"><code><coding>"#,
                r#"<system value="http://example.org/codes"/><code value="note"/>"#,
                r#"</coding><text value="a &amp; b"/></code></Basic>"#
            )
        );
        Ok(())
    }

    #[test]
    fn test_declaration_is_optional() -> Result<()> {
        let config = XmlConfig {
            declaration: false,
            ..Default::default()
        };
        let xml = to_xml_string_with(&basic(), &config)?;
        assert!(xml.starts_with(r#"<Basic xmlns="http://hl7.org/fhir">"#));
        Ok(())
    }

    #[test]
    fn test_pretty_output_is_indented() -> Result<()> {
        let config = XmlConfig {
            pretty: true,
            declaration: false,
        };
        let xml = to_xml_string_with(&basic(), &config)?;
        assert!(xml.contains("\n  <code>\n    <coding>"));
        Ok(())
    }

    #[test]
    fn test_only_resources_are_documents() {
        let err = to_xml_string(&CodeableConcept::text("x")).unwrap_err();
        assert!(err.to_string().contains("only resources"));
    }

    #[test]
    fn test_div_without_namespace_gets_xhtml_namespace() {
        let start = with_xhtml_namespace(BytesStart::new("div"));
        let declared: Vec<_> = start
            .attributes()
            .flatten()
            .map(|a| String::from_utf8(a.value.to_vec()).unwrap())
            .collect();
        assert_eq!(declared, vec![utils::XHTML_NAMESPACE.to_string()]);
    }
}
