/// Contained resources are decoded through the boxed `Resource` union, which
/// re-enters the decoder once per nesting level. These tests keep that path
/// cheap enough for small thread stacks.
use fhirkit::*;

const SUBSTANCE_WITH_CONTAINED: &str = r##"{
  "resourceType": "SubstanceDefinition",
  "id": "aspirin",
  "contained": [
    {
      "resourceType": "Basic",
      "id": "manufacturer-note",
      "code": { "text": "note" }
    }
  ],
  "text": {
    "status": "generated",
    "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\">Aspirin</div>"
  },
  "manufacturer": [
    { "reference": "#manufacturer-note" }
  ],
  "moiety": [
    {
      "name": "acetylsalicylic acid",
      "amountQuantity": { "value": 180.16, "unit": "g/mol" }
    }
  ]
}"##;

#[test]
fn test_resource_enum_size_is_reasonable() {
    let size = std::mem::size_of::<Resource>();
    assert!(
        size <= 16,
        "Resource is {} bytes; every variant should be boxed",
        size
    );
}

#[test]
fn test_deserialize_contained_resource_small_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let substance: SubstanceDefinition =
                serde_json::from_str(SUBSTANCE_WITH_CONTAINED).expect("decode");
            assert_eq!(substance.contained.len(), 1);
            assert_eq!(substance.contained[0].resource_type(), "Basic");
            let moiety = &substance.moiety[0];
            assert!(matches!(
                moiety.amount,
                Some(SubstanceDefinitionMoietyAmount::Quantity(_))
            ));
            serde_json::to_string(&substance).expect("encode")
        })
        .expect("spawn");
    let encoded = handle.join().expect("thread panicked");
    assert!(encoded.contains(r##""contained":[{"resourceType":"Basic","id":"manufacturer-note""##));
}

#[test]
fn test_nested_contained_round_trip() {
    let inner = Basic {
        id: Some(Id::parse("inner").unwrap()),
        code: CodeableConcept::text("inner"),
        ..Default::default()
    };
    let middle = Basic {
        id: Some(Id::parse("middle").unwrap()),
        code: CodeableConcept::text("middle"),
        contained: vec![inner.into()],
        ..Default::default()
    };
    let outer = SubstanceDefinition {
        contained: vec![middle.into()],
        ..Default::default()
    };

    let json = serde_json::to_string(&outer).unwrap();
    let decoded: SubstanceDefinition = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, outer);
}
