//! XML deserialization.
//!
//! The reader pulls quick-xml events and fills the target through the
//! model's slots: each child element name is resolved against the enclosing
//! type's descriptor, a fresh value of the selected type is placed in the
//! field, and the element's attributes and children are read into it.
//!
//! Unknown child elements are skipped. Unknown attributes, stray text,
//! duplicate values and conflicting choice members are structural errors.

use std::io::BufRead;

use fhirkit::{Element, Extension, FhirValue, FieldMut, PrimitiveElement, ValueKind, ValueMut};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Location, Result, SerdeError, StructuralError};
use crate::xml::utils;

/// Deserialize a FHIR resource from an XML string.
///
/// # Examples
///
/// ```ignore
/// use fhirkit_serde::xml::from_xml_str;
/// use fhirkit::Basic;
///
/// let xml = r#"<?xml version="1.0"?>
/// <Basic xmlns="http://hl7.org/fhir">
///   <id value="example"/>
///   <code><text value="note"/></code>
/// </Basic>"#;
/// let basic: Basic = from_xml_str(xml)?;
/// ```
pub fn from_xml_str<T>(xml: &str) -> Result<T>
where
    T: FhirValue,
{
    tracing::debug!(format = "xml", bytes = xml.len(), "decoding");
    from_xml_reader(xml.as_bytes())
}

/// Deserialize a FHIR resource from XML bytes.
pub fn from_xml_slice<T>(xml: &[u8]) -> Result<T>
where
    T: FhirValue,
{
    let xml_str = std::str::from_utf8(xml)
        .map_err(|e| SerdeError::Custom(format!("Invalid UTF-8: {}", e)))?;
    from_xml_str(xml_str)
}

/// Deserialize a FHIR resource from an XML reader.
pub fn from_xml_reader<R: BufRead, T: FhirValue>(reader: R) -> Result<T> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(false);

    let mut deserializer = XmlDeserializer::new(xml_reader);
    deserializer.read_document()
}

/// Per-field bookkeeping while reading one element's children.
#[derive(Debug, Clone, Copy, Default)]
struct FieldState {
    seen: bool,
    choice: Option<&'static str>,
}

struct XmlDeserializer<R: BufRead> {
    reader: Reader<R>,
    /// Buffer for reading events
    buf: Vec<u8>,
}

impl<R: BufRead> XmlDeserializer<R> {
    fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    fn next_event(&mut self) -> Result<Event<'static>> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(e) => Err(SerdeError::Xml(e)),
        }
    }

    /// A structural error at the reader's current position.
    fn error(&self, element: &str, message: impl Into<String>) -> SerdeError {
        StructuralError::new(message)
            .in_element(element)
            .at(Location::ByteOffset(self.reader.buffer_position()))
            .into()
    }

    fn name_of(&self, start: &BytesStart<'_>) -> Result<String> {
        utils::local_name(start).map_err(|e| self.error("document", e.to_string()))
    }

    fn read_document<T: FhirValue>(&mut self) -> Result<T> {
        let (start, empty) = loop {
            match self.next_event()? {
                Event::Start(start) => break (start, false),
                Event::Empty(start) => break (start, true),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                Event::Eof => return Err(self.error("document", "no root element")),
                _ => {
                    return Err(self.error(
                        "document",
                        "unexpected content before the root element",
                    ));
                }
            }
        };

        let name = self.name_of(&start)?;
        let mut value = T::instantiate(&name)
            .ok_or_else(|| self.error("document", format!("unknown resource type `{}`", name)))?;
        match value.as_value_mut() {
            ValueMut::Element(resource) if resource.descriptor().kind == ValueKind::Resource => {
                self.read_composite(resource, &start, empty)?;
            }
            _ => return Err(self.error("document", format!("`{}` is not a resource", name))),
        }

        loop {
            match self.next_event()? {
                Event::Eof => return Ok(value),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                _ => {
                    return Err(self.error(
                        "document",
                        "unexpected content after the root element",
                    ));
                }
            }
        }
    }

    /// Unescaped attributes of `start`, with namespace declarations checked
    /// and removed.
    fn attributes(&self, owner: &str, start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.error(owner, e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| self.error(owner, e.to_string()))?
                .to_string();
            let raw = std::str::from_utf8(&attr.value).map_err(|e| self.error(owner, e.to_string()))?;
            let value = unescape(raw)
                .map_err(|e| self.error(owner, e.to_string()))?
                .into_owned();

            if utils::is_namespace_attribute(&key) {
                if key == "xmlns" && value != utils::FHIR_NAMESPACE {
                    return Err(self.error(owner, format!("unexpected namespace `{}`", value)));
                }
                continue;
            }
            attributes.push((key, value));
        }
        Ok(attributes)
    }

    fn read_composite(
        &mut self,
        element: &mut dyn Element,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        let descriptor = element.descriptor();
        for (key, value) in self.attributes(descriptor.name, start)? {
            let wire = descriptor
                .lookup(&key)
                .filter(|wire| descriptor.fields[wire.index].is_attribute());
            match wire.and_then(|wire| element.field_mut(wire.index)) {
                Some(FieldMut::Attribute(slot)) => slot.set(value),
                _ => {
                    return Err(self.error(descriptor.name, format!("unknown attribute `{}`", key)));
                }
            }
        }
        if empty {
            return Ok(());
        }

        let mut states = vec![FieldState::default(); descriptor.fields.len()];
        loop {
            match self.next_event()? {
                Event::Start(child) => self.read_child(element, &mut states, child, false)?,
                Event::Empty(child) => self.read_child(element, &mut states, child, true)?,
                Event::End(_) => return Ok(()),
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => {
                    return Err(self.error(descriptor.name, "unexpected end of document"));
                }
                _ => return Err(self.error(descriptor.name, "unexpected text content")),
            }
        }
    }

    fn read_child(
        &mut self,
        element: &mut dyn Element,
        states: &mut [FieldState],
        child: BytesStart<'static>,
        empty: bool,
    ) -> Result<()> {
        let descriptor = element.descriptor();
        let name = self.name_of(&child)?;
        let Some(wire) = descriptor
            .lookup(&name)
            .filter(|wire| !descriptor.fields[wire.index].is_attribute())
        else {
            tracing::debug!(element = %name, parent = descriptor.name, "skipping unknown XML element");
            if !empty {
                self.skip_element()?;
            }
            return Ok(());
        };

        let field = &descriptor.fields[wire.index];
        let state = &mut states[wire.index];
        if let (Some(previous), Some(current)) = (state.choice, wire.choice_type) {
            if previous != current {
                return Err(self.error(
                    descriptor.name,
                    format!(
                        "duplicate choice field value: <{}> conflicts with <{}>",
                        name,
                        field.wire_name(previous)
                    ),
                ));
            }
        }
        if state.seen && !field.is_repeated() {
            return Err(self.error(descriptor.name, format!("duplicate element <{}>", name)));
        }
        state.seen = true;
        state.choice = wire.choice_type;

        if field.kind == ValueKind::Resource {
            return self.read_contained(element, wire.index, &name, empty);
        }

        let type_name = wire
            .choice_type
            .or_else(|| field.types.first().copied())
            .unwrap_or_default();
        let value = match element.field_mut(wire.index) {
            Some(FieldMut::Optional(slot)) => slot.reset(type_name),
            Some(FieldMut::Required(slot)) => slot.reset(type_name),
            Some(FieldMut::Repeated(slot)) => slot.push(type_name),
            Some(FieldMut::Attribute(_)) | None => None,
        };
        let Some(value) = value else {
            return Err(self.error(
                descriptor.name,
                format!("<{}> cannot hold a {} value", name, type_name),
            ));
        };
        self.read_value(value, descriptor.name, &name, &child, empty)
    }

    /// `<contained><Type>...</Type></contained>`: the inner element name
    /// selects the resource type.
    fn read_contained(
        &mut self,
        element: &mut dyn Element,
        index: usize,
        wrapper: &str,
        empty: bool,
    ) -> Result<()> {
        let owner = element.descriptor().name;
        if empty {
            return Err(self.error(owner, format!("<{}> does not hold a resource", wrapper)));
        }
        let (start, inner_empty) = loop {
            match self.next_event()? {
                Event::Start(start) => break (start, false),
                Event::Empty(start) => break (start, true),
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                _ => {
                    return Err(self.error(owner, format!("<{}> does not hold a resource", wrapper)));
                }
            }
        };

        let resource_type = self.name_of(&start)?;
        let value = match element.field_mut(index) {
            Some(FieldMut::Optional(slot)) => slot.reset(&resource_type),
            Some(FieldMut::Required(slot)) => slot.reset(&resource_type),
            Some(FieldMut::Repeated(slot)) => slot.push(&resource_type),
            Some(FieldMut::Attribute(_)) | None => None,
        };
        match value {
            Some(ValueMut::Element(resource)) => self.read_composite(resource, &start, inner_empty)?,
            _ => {
                return Err(self.error(
                    owner,
                    format!("unknown resource type `{}`", resource_type),
                ));
            }
        }

        loop {
            match self.next_event()? {
                Event::End(_) => return Ok(()),
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                _ => {
                    return Err(self.error(
                        owner,
                        format!("<{}> holds more than one resource", wrapper),
                    ));
                }
            }
        }
    }

    /// Reads the value of field `name`; errors name `owner`, the element
    /// the field belongs to.
    fn read_value(
        &mut self,
        value: ValueMut<'_>,
        owner: &str,
        name: &str,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        match value {
            ValueMut::Primitive(primitive) if primitive.type_name() == utils::XHTML_TYPE => {
                let content = self.get_outer_xml(start, empty)?;
                primitive
                    .set_text(&content)
                    .map_err(|e| self.error(owner, format!("{} for `{}`", e, name)))
            }
            ValueMut::Primitive(primitive) => {
                self.read_primitive(primitive, owner, name, start, empty)
            }
            ValueMut::Element(element) => self.read_composite(element, start, empty),
        }
    }

    /// `<name id=".." value="..">` with optional `<extension>` children.
    fn read_primitive(
        &mut self,
        primitive: &mut dyn PrimitiveElement,
        owner: &str,
        name: &str,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        for (key, value) in self.attributes(owner, start)? {
            match key.as_str() {
                "id" => primitive.set_id(Some(value)),
                "value" => primitive
                    .set_text(&value)
                    .map_err(|e| self.error(owner, format!("{} for `{}`", e, name)))?,
                _ => {
                    return Err(self.error(
                        owner,
                        format!("unknown attribute `{}` on `{}`", key, name),
                    ));
                }
            }
        }
        if empty {
            return Ok(());
        }

        loop {
            match self.next_event()? {
                Event::Start(child) => self.read_primitive_child(primitive, name, child, false)?,
                Event::Empty(child) => self.read_primitive_child(primitive, name, child, true)?,
                Event::End(_) => return Ok(()),
                Event::Text(text) if utils::is_whitespace_text(&text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => {
                    return Err(self.error(owner, format!("unexpected end of document in `{}`", name)));
                }
                _ => return Err(self.error(owner, format!("unexpected text content in `{}`", name))),
            }
        }
    }

    fn read_primitive_child(
        &mut self,
        primitive: &mut dyn PrimitiveElement,
        name: &str,
        child: BytesStart<'static>,
        empty: bool,
    ) -> Result<()> {
        let child_name = self.name_of(&child)?;
        if child_name != "extension" {
            tracing::debug!(element = %child_name, parent = name, "skipping unknown XML element");
            if !empty {
                self.skip_element()?;
            }
            return Ok(());
        }
        let mut extension = Extension::default();
        self.read_composite(&mut extension, &child, empty)?;
        primitive.extension_mut().push(extension);
        Ok(())
    }

    /// Re-serializes `start`, its content and its end tag, unchanged.
    fn get_outer_xml(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        if empty {
            writer.write_event(Event::Empty(start.clone()))?;
        } else {
            writer.write_event(Event::Start(start.clone()))?;
            let mut depth = 1usize;
            while depth > 0 {
                let event = self.next_event()?;
                match &event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => depth -= 1,
                    Event::Eof => {
                        return Err(self.error(utils::XHTML_TYPE, "unexpected end of document"));
                    }
                    _ => {}
                }
                writer.write_event(event)?;
            }
        }
        String::from_utf8(writer.into_inner()).map_err(|e| SerdeError::Custom(e.to_string()))
    }

    /// Skips everything up to and including the end tag of the current element.
    fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(self.error("document", "unexpected end of document")),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirkit::{Basic, CodeableConcept, FhirString};

    #[test]
    fn test_read_basic() -> Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Basic xmlns="http://hl7.org/fhir">
  <!-- comment -->
  <id value="b1"/>
  <code>
    <text value="a &amp; b"/>
  </code>
</Basic>"#;
        let basic: Basic = from_xml_str(xml)?;
        assert_eq!(
            basic.id.as_ref().and_then(|id| id.value.as_ref()).map(|v| v.as_str()),
            Some("b1")
        );
        assert_eq!(basic.code, CodeableConcept::text("a & b"));
        Ok(())
    }

    #[test]
    fn test_unknown_children_are_skipped() -> Result<()> {
        let xml = r#"<Basic xmlns="http://hl7.org/fhir"><code><text value="x"/><future><deep/></future></code></Basic>"#;
        let basic: Basic = from_xml_str(xml)?;
        assert_eq!(basic.code.text, Some(FhirString::from("x")));
        Ok(())
    }

    #[test]
    fn test_structural_errors_carry_offsets() {
        let xml = r#"<Basic xmlns="http://hl7.org/fhir"><code><text value="x" foo="y"/></code></Basic>"#;
        match from_xml_str::<Basic>(xml).unwrap_err() {
            SerdeError::Structural(e) => {
                assert_eq!(e.message, "unknown attribute `foo` on `text`");
                assert_eq!(e.element.as_deref(), Some("CodeableConcept"));
                assert!(matches!(e.location, Some(Location::ByteOffset(offset)) if offset > 0));
            }
            other => panic!("expected a structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_lexical_errors_name_owner_and_field() {
        let xml = r#"<Basic xmlns="http://hl7.org/fhir"><code><coding><code value="a  b"/></coding></code></Basic>"#;
        match from_xml_str::<Basic>(xml).unwrap_err() {
            SerdeError::Structural(e) => {
                assert_eq!(e.element.as_deref(), Some("Coding"));
                assert!(e.message.contains("for `code`"), "{}", e.message);
                assert!(e.message.contains("a  b"), "{}", e.message);
            }
            other => panic!("expected a structural error, got {:?}", other),
        }
    }
}
