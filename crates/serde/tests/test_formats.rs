use fhirkit::*;
use fhirkit_serde::{FhirFormat, Location, Result, SerdeError};
use rust_decimal_macros::dec;

fn substance() -> SubstanceDefinition {
    SubstanceDefinition {
        id: Some(Id::parse("aspirin").unwrap()),
        status: Some(CodeableConcept::text("active")),
        moiety: vec![SubstanceDefinitionMoiety {
            name: Some(FhirString::from("acetylsalicylic acid")),
            amount: Some(SubstanceDefinitionMoietyAmount::Quantity(Box::new(
                Quantity {
                    value: Some(Decimal::from(dec!(180.16))),
                    unit: Some(FhirString::from("g/mol")),
                    ..Default::default()
                },
            ))),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn test_every_format_round_trips() -> Result<()> {
    let original: Resource = substance().into();
    let formats = if cfg!(feature = "xml") {
        vec![FhirFormat::Json, FhirFormat::Xml]
    } else {
        vec![FhirFormat::Json]
    };
    for format in formats {
        for pretty in [false, true] {
            let text = format.encode(&original, pretty)?;
            let decoded: Resource = format.decode(&text)?;
            assert_eq!(decoded, original, "{} pretty={}", format, pretty);
        }
    }
    Ok(())
}

#[test]
fn test_json_errors_carry_line_and_column() {
    let input = "{\n  \"resourceType\": \"Basic\",\n  \"code\": 7\n}";
    match FhirFormat::Json.decode::<Basic>(input).unwrap_err() {
        SerdeError::Structural(e) => {
            assert!(e.message.contains("expected a CodeableConcept object"));
            assert!(matches!(e.location, Some(Location::LineColumn { line: 3, .. })));
        }
        other => panic!("expected a structural error, got {:?}", other),
    }
}

#[test]
fn test_json_errors_name_the_enclosing_element() {
    let input = concat!(
        "{\n",
        "  \"resourceType\": \"Basic\",\n",
        "  \"code\": {\"coding\": [{\"code\": \"a  b\"}]},\n",
        "  \"created\": \"2020\"\n",
        "}"
    );
    match FhirFormat::Json.decode::<Basic>(input).unwrap_err() {
        SerdeError::Structural(e) => {
            assert_eq!(e.element.as_deref(), Some("Coding"));
            assert_eq!(e.message, "invalid code value `a  b` for `code`");
            assert!(matches!(e.location, Some(Location::LineColumn { line: 3, .. })));
        }
        other => panic!("expected a structural error, got {:?}", other),
    }

    let input = concat!(
        "{\"resourceType\": \"Basic\",\n",
        " \"code\": {\"text\": \"x\"},\n",
        " \"contained\": [\n",
        "  {\"resourceType\": \"Basic\", \"code\": {\"text\": \"y\"},\n",
        "   \"created\": \"2020-13-01\"}]}"
    );
    match FhirFormat::Json.decode::<Basic>(input).unwrap_err() {
        SerdeError::Structural(e) => {
            assert_eq!(e.element.as_deref(), Some("Basic"));
            assert_eq!(e.message, "invalid date value `2020-13-01` for `created`");
            assert!(matches!(e.location, Some(Location::LineColumn { line: 5, .. })));
        }
        other => panic!("expected a structural error, got {:?}", other),
    }
}

#[test]
fn test_missing_resource_type_is_structural() {
    let err = FhirFormat::Json
        .decode::<Resource>(r#"{"code":{"text":"x"}}"#)
        .unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("missing `resourceType`"));
}

#[test]
fn test_encoding_never_writes_partial_output() {
    let mut out = Vec::new();
    let err = fhirkit_serde::to_json_writer(&mut out, &Basic::default()).unwrap_err();
    assert!(err.is_invariant());
    assert!(out.is_empty());
}
