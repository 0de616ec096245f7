//! Subcommand implementations.
//!
//! Each command renders to a `String` so the output can be checked without a
//! process; `main` only decides where the text goes.

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use fhirkit::{FhirValue, Resource, ValueRef, registry};
use fhirkit_serde::FhirFormat;
use tracing::{debug, info};

/// Reads a file, or standard input for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading standard input")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn decode(input: &str, format: FhirFormat) -> Result<Resource> {
    let resource: Resource = format
        .decode(input)
        .with_context(|| format!("decoding {} input", format))?;
    debug!(resource_type = resource.resource_type(), format = %format, "decoded");
    Ok(resource)
}

pub fn convert(input: &str, from: FhirFormat, to: FhirFormat, pretty: bool) -> Result<String> {
    let resource = decode(input, from)?;
    info!(resource_type = resource.resource_type(), from = %from, to = %to, "converting");
    let output = to
        .encode(&resource, pretty)
        .with_context(|| format!("encoding {} output", to))?;
    Ok(output)
}

/// One line per node: `name: type` and, for leaves, ` = value`.
pub fn inspect(resource: &Resource, select: &[String]) -> String {
    let root = resource.as_value();
    let mut out = String::new();
    let _ = writeln!(out, "{}", root.type_name());

    let names: Vec<&str> = select.iter().map(String::as_str).collect();
    let selector = if names.is_empty() {
        None
    } else {
        Some(names.as_slice())
    };
    for child in root.children(selector) {
        write_node(&mut out, child.name, child.value, 1);
    }
    out
}

fn write_node(out: &mut String, name: &str, value: ValueRef<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{}{}: {}", indent, name, value.type_name());
    match value {
        ValueRef::Primitive(primitive) => {
            if let Some(scalar) = primitive.scalar() {
                let _ = write!(out, " = {}", scalar.to_text());
            }
        }
        ValueRef::System(text) => {
            let _ = write!(out, " = {}", text);
        }
        ValueRef::Element(_) => {}
    }
    out.push('\n');

    for child in value.children(None) {
        write_node(out, child.name, child.value, depth + 1);
    }
}

/// Static class info of a registered type.
pub fn type_info(type_name: &str) -> Result<String> {
    let info = registry::class_info(type_name).ok_or_else(|| {
        anyhow!(
            "unknown type `{}`; known types: {}",
            type_name,
            registry::type_names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let mut out = info.qualified_name();
    if let Some(base) = &info.base_type {
        let _ = write!(out, " : {}", base);
    }
    out.push('\n');
    for element in &info.elements {
        let _ = writeln!(
            out,
            "  {}: {}{}",
            element.name,
            element.type_names.join(" | "),
            if element.is_list { " [0..*]" } else { "" }
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"{"resourceType":"Basic","id":"b1","code":{"coding":[{"code":"note"}],"text":"x"}}"#;

    #[test]
    fn test_convert_json_to_xml_and_back() {
        let xml = convert(BASIC, FhirFormat::Json, FhirFormat::Xml, false).unwrap();
        assert!(xml.contains(r#"<Basic xmlns="http://hl7.org/fhir"><id value="b1"/>"#));
        let json = convert(&xml, FhirFormat::Xml, FhirFormat::Json, false).unwrap();
        assert_eq!(json, BASIC);
    }

    #[test]
    fn test_convert_reports_decode_errors() {
        let err = convert("{}", FhirFormat::Json, FhirFormat::Xml, false).unwrap_err();
        assert!(format!("{:#}", err).contains("missing `resourceType`"));
    }

    #[test]
    fn test_inspect_tree() {
        let resource = decode(BASIC, FhirFormat::Json).unwrap();
        assert_eq!(
            inspect(&resource, &[]),
            "Basic\n  id: id = b1\n  code: CodeableConcept\n    coding: Coding\n      code: code = note\n    text: string = x\n"
        );
        assert_eq!(
            inspect(&resource, &["code".to_string()]).lines().nth(1),
            Some("  code: CodeableConcept")
        );
    }

    #[test]
    fn test_type_info() {
        let text = type_info("Quantity").unwrap();
        assert!(text.starts_with("FHIR.Quantity : FHIR.Element\n"));
        assert!(text.contains("  value: FHIR.decimal\n"));
        assert!(text.contains("  extension: FHIR.Extension [0..*]\n"));
        assert!(type_info("Patient").is_err());
    }
}
