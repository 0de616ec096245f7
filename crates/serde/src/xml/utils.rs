//! Constants and small helpers shared by the XML reader and writer.

use quick_xml::events::{BytesStart, BytesText};

/// FHIR namespace URI.
///
/// This namespace is added to the root resource element in FHIR XML documents.
pub const FHIR_NAMESPACE: &str = "http://hl7.org/fhir";

/// XHTML namespace carried by narrative `<div>` elements.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// FHIR type name of narrative content.
pub const XHTML_TYPE: &str = "xhtml";

/// Checks if text content consists only of XML whitespace.
pub fn is_whitespace_text(text: &BytesText) -> bool {
    text.iter()
        .all(|&b| b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
}

/// Checks if an attribute is a namespace declaration (`xmlns` or `xmlns:*`).
pub fn is_namespace_attribute(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

/// The element's local name, without any namespace prefix.
pub fn local_name(start: &BytesStart) -> Result<String, std::str::Utf8Error> {
    std::str::from_utf8(start.local_name().as_ref()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_whitespace_text() {
        assert!(is_whitespace_text(&BytesText::new(" \n\t ")));
        assert!(is_whitespace_text(&BytesText::new("")));
        assert!(!is_whitespace_text(&BytesText::new(" x ")));
    }

    #[test]
    fn test_is_namespace_attribute() {
        assert!(is_namespace_attribute("xmlns"));
        assert!(is_namespace_attribute("xmlns:xhtml"));
        assert!(!is_namespace_attribute("xmlnsx"));
        assert!(!is_namespace_attribute("value"));
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let start = BytesStart::new("fhir:Basic");
        assert_eq!(local_name(&start).unwrap(), "Basic");
        assert_eq!(local_name(&BytesStart::new("code")).unwrap(), "code");
    }
}
