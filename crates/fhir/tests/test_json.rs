use fhirkit::*;
use serde_json::json;

const SCENARIO: &str = r#"{"resourceType":"SubstanceDefinition","status":{"text":"x"},"property":[{"type":{"text":"t"},"valueBoolean":true}]}"#;

#[test]
fn test_substance_definition_scenario() {
    let substance: SubstanceDefinition = serde_json::from_str(SCENARIO).unwrap();

    assert_eq!(substance.status, Some(CodeableConcept::text("x")));
    assert_eq!(substance.property.len(), 1);
    let value = substance.property[0].value.as_ref().unwrap();
    assert_eq!(
        *value,
        SubstanceDefinitionPropertyValue::Boolean(Boolean::new(true))
    );
    assert_eq!(value.as_value().to_boolean(), Ok(true));

    assert_eq!(serde_json::to_string(&substance).unwrap(), SCENARIO);
}

#[test]
fn test_primitive_value_and_metadata_merge_in_either_order() {
    let value_only: CodeableConcept = serde_json::from_str(r#"{"text":"v"}"#).unwrap();
    assert_eq!(value_only.text, Some(FhirString::from("v")));

    let meta_only: CodeableConcept = serde_json::from_str(r#"{"_text":{"id":"1"}}"#).unwrap();
    let text = meta_only.text.as_ref().unwrap();
    assert_eq!(text.id.as_deref(), Some("1"));
    assert_eq!(text.value, None);

    let expected = Some(FhirString::from("v").with_id("1"));
    let both: CodeableConcept =
        serde_json::from_str(r#"{"text":"v","_text":{"id":"1"}}"#).unwrap();
    assert_eq!(both.text, expected);
    let reversed: CodeableConcept =
        serde_json::from_str(r#"{"_text":{"id":"1"},"text":"v"}"#).unwrap();
    assert_eq!(reversed.text, expected);
}

#[test]
fn test_metadata_only_primitive_writes_only_underscore_key() {
    let concept = CodeableConcept {
        text: Some(FhirString::default().with_id("1")),
        ..Default::default()
    };
    assert_eq!(
        serde_json::to_string(&concept).unwrap(),
        r#"{"_text":{"id":"1"}}"#
    );
}

#[test]
fn test_primitive_extension_round_trip() {
    let input = r#"{"text":"v","_text":{"extension":[{"url":"http://example.org/e","valueString":"z"}]}}"#;
    let concept: CodeableConcept = serde_json::from_str(input).unwrap();
    let text = concept.text.as_ref().unwrap();
    assert_eq!(text.extension.len(), 1);
    assert_eq!(text.extension[0].url, "http://example.org/e");
    assert_eq!(serde_json::to_string(&concept).unwrap(), input);
}

#[test]
fn test_repeated_primitives_are_index_aligned() {
    let input = r#"{"profile":["http://example.org/a",null],"_profile":[null,{"id":"p2"}]}"#;
    let meta: Meta = serde_json::from_str(input).unwrap();
    assert_eq!(meta.profile.len(), 2);
    assert_eq!(
        meta.profile[0].value.as_ref().map(|v| v.as_str()),
        Some("http://example.org/a")
    );
    assert_eq!(meta.profile[0].id, None);
    assert_eq!(meta.profile[1].value, None);
    assert_eq!(meta.profile[1].id.as_deref(), Some("p2"));

    let metadata_first: Meta = serde_json::from_str(
        r#"{"_profile":[null,{"id":"p2"}],"profile":["http://example.org/a",null]}"#,
    )
    .unwrap();
    assert_eq!(metadata_first, meta);

    assert_eq!(serde_json::to_string(&meta).unwrap(), input);
}

#[test]
fn test_false_and_zero_are_not_absent() {
    let input = r#"{"resourceType":"SubstanceDefinition","name":[{"name":"aspirin","preferred":false}]}"#;
    let substance: SubstanceDefinition = serde_json::from_str(input).unwrap();
    assert_eq!(substance.name[0].preferred, Some(Boolean::new(false)));
    assert_eq!(serde_json::to_string(&substance).unwrap(), input);

    let attachment: Attachment = serde_json::from_str(r#"{"size":0}"#).unwrap();
    assert_eq!(serde_json::to_string(&attachment).unwrap(), r#"{"size":0}"#);
}

#[test]
fn test_decimal_keeps_its_text() {
    let input = r#"{"value":1.50,"unit":"mg"}"#;
    let quantity: Quantity = serde_json::from_str(input).unwrap();
    assert_eq!(quantity.value.as_ref().unwrap().value.as_ref().unwrap().value().scale(), 2);
    assert_eq!(serde_json::to_string(&quantity).unwrap(), input);

    let input = r#"{"value":1.5e2}"#;
    let quantity: Quantity = serde_json::from_str(input).unwrap();
    let value = quantity.value.as_ref().unwrap().value.as_ref().unwrap();
    assert_eq!(value.value(), rust_decimal::Decimal::from(150));
    assert_eq!(value.original_string(), "1.5e2");
    assert_eq!(serde_json::to_string(&quantity).unwrap(), input);
}

#[test]
fn test_empty_values_are_omitted() {
    let substance = SubstanceDefinition {
        status: Some(CodeableConcept::default()),
        classification: vec![CodeableConcept::default(), CodeableConcept::default()],
        description: Some(Markdown::default()),
        ..Default::default()
    };
    assert_eq!(
        serde_json::to_value(&substance).unwrap(),
        json!({"resourceType": "SubstanceDefinition"})
    );
}

#[test]
fn test_contained_resources_dispatch_on_resource_type() {
    let input = r#"{"resourceType":"Basic","contained":[{"resourceType":"SubstanceDefinition","id":"sub1","status":{"text":"active"}}],"code":{"text":"x"}}"#;
    let basic: Basic = serde_json::from_str(input).unwrap();
    assert_eq!(basic.contained.len(), 1);
    match &basic.contained[0] {
        Resource::SubstanceDefinition(substance) => {
            assert_eq!(
                substance.id.as_ref().and_then(|id| id.value.as_ref()).map(|v| v.as_str()),
                Some("sub1")
            );
        }
        other => panic!("unexpected contained resource {:?}", other),
    }
    assert_eq!(serde_json::to_string(&basic).unwrap(), input);
}

#[test]
fn test_resource_union() {
    let resource: Resource =
        serde_json::from_str(r#"{"resourceType":"Basic","code":{"text":"x"}}"#).unwrap();
    assert_eq!(resource.resource_type(), "Basic");
    assert_eq!(
        serde_json::to_value(&resource).unwrap(),
        json!({"resourceType": "Basic", "code": {"text": "x"}})
    );

    let err = serde_json::from_str::<Resource>(r#"{"code":{"text":"x"}}"#).unwrap_err();
    assert!(err.to_string().contains("missing `resourceType`"));

    let err = serde_json::from_str::<Resource>(r#"{"resourceType":"Patient"}"#).unwrap_err();
    assert!(err.to_string().contains("unknown resource type `Patient`"));
}

#[test]
fn test_resource_union_conversions() {
    let basic = Basic {
        code: CodeableConcept::text("x"),
        ..Default::default()
    };
    let from_value = Resource::from(basic.clone());
    assert_eq!(from_value, Resource::from(Box::new(basic)));
    assert_eq!(from_value.resource_type(), "Basic");
    assert_eq!(
        Resource::from(SubstanceDefinition::default()).resource_type(),
        "SubstanceDefinition"
    );
}

#[test]
fn test_resource_type_of_concrete_type_is_not_data() {
    let substance: SubstanceDefinition =
        serde_json::from_str(r#"{"resourceType":"Basic","version":"1"}"#).unwrap();
    assert_eq!(substance.version, Some(FhirString::from("1")));
    assert!(
        serde_json::to_string(&substance)
            .unwrap()
            .starts_with(r#"{"resourceType":"SubstanceDefinition""#)
    );
}

#[test]
fn test_conflicting_choice_types_are_rejected() {
    let input = r#"{"resourceType":"SubstanceDefinition","property":[{"type":{"text":"t"},"valueBoolean":true,"valueDate":"2020-01-01"}]}"#;
    let err = serde_json::from_str::<SubstanceDefinition>(input).unwrap_err();
    assert!(err.to_string().contains("duplicate choice field value"));
}

#[test]
fn test_choice_metadata_merges_with_its_value() {
    let input = r#"{"type":{"text":"t"},"valueDate":"2020-01-01","_valueDate":{"id":"d1"}}"#;
    let property: SubstanceDefinitionProperty = serde_json::from_str(input).unwrap();
    match property.value.as_ref().unwrap() {
        SubstanceDefinitionPropertyValue::Date(date) => {
            assert_eq!(date.id.as_deref(), Some("d1"));
            assert_eq!(date.value.as_ref().map(|v| v.as_str()), Some("2020-01-01"));
        }
        other => panic!("unexpected value {:?}", other),
    }
    assert_eq!(serde_json::to_string(&property).unwrap(), input);
}

#[test]
fn test_structural_errors() {
    let err = serde_json::from_str::<Basic>(r#"{"resourceType":"Basic","code":{"text":"x"},"foo":1}"#)
        .unwrap_err();
    assert!(err.to_string().contains("unknown field `foo` in Basic"));

    let err = serde_json::from_str::<Basic>(r#"{"resourceType":"Basic","code":"x"}"#).unwrap_err();
    assert!(err.to_string().contains("expected a CodeableConcept object"));

    let err = serde_json::from_str::<CodeableConcept>(r#"{"text":"a","text":"b"}"#).unwrap_err();
    assert!(err.to_string().contains("duplicate field `text` in CodeableConcept"));

    let err = serde_json::from_str::<CodeableConcept>(r#"{"text":null}"#).unwrap_err();
    assert!(
        err.to_string()
            .contains("null is not a valid string value for `text` in CodeableConcept")
    );

    let err = serde_json::from_str::<CodeableConcept>(r#"{"_coding":[{"id":"c"}]}"#).unwrap_err();
    assert!(err.to_string().contains("unknown field `_coding` in CodeableConcept"));
}

#[test]
fn test_invalid_lexical_forms_name_the_type() {
    let err = serde_json::from_str::<Basic>(
        r#"{"resourceType":"Basic","code":{"text":"x"},"created":"2020-13-01"}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("invalid date value `2020-13-01`"));

    let err = serde_json::from_str::<Attachment>(r#"{"size":"12"}"#).unwrap_err();
    assert!(err.to_string().contains("unsignedInt"));
}

#[test]
fn test_nested_errors_name_field_and_owner() {
    let err = serde_json::from_str::<Basic>(
        r#"{"resourceType":"Basic","code":{"coding":[{"system":"http://x","code":"a  b"}]}}"#,
    )
    .unwrap_err();
    assert!(
        err.to_string()
            .starts_with("invalid code value `a  b` for `code` in Coding at line 1"),
        "{}",
        err
    );

    let err = serde_json::from_str::<Basic>(r#"{"resourceType":"Basic","code":{"coding":{}}}"#)
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("expected an array of Coding for `coding` in CodeableConcept"),
        "{}",
        err
    );

    let err = serde_json::from_str::<Basic>(r#"{"resourceType":"Basic","code":{"text":{}}}"#)
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("expected a string value for `text` in CodeableConcept"),
        "{}",
        err
    );

    let err = serde_json::from_str::<Basic>(
        r#"{"resourceType":"Basic","code":{"text":"x"},"_created":{"value":"2020"}}"#,
    )
    .unwrap_err();
    assert!(
        err.to_string()
            .contains("unknown field `value` in the metadata of `_created` in Basic"),
        "{}",
        err
    );
}

#[test]
fn test_misaligned_primitive_arrays_are_rejected() {
    let err = serde_json::from_str::<Meta>(
        r#"{"profile":["http://example.org/a","http://example.org/b"],"_profile":[{"id":"p1"}]}"#,
    )
    .unwrap_err();
    assert!(
        err.to_string()
            .contains("`profile` has 2 entries but `_profile` has 1 in Meta"),
        "{}",
        err
    );

    let err = serde_json::from_str::<Meta>(r#"{"profile":[null]}"#).unwrap_err();
    assert!(
        err.to_string()
            .contains("entry 0 of `profile` has neither a value nor metadata in Meta"),
        "{}",
        err
    );

    let err = serde_json::from_str::<Meta>(
        r#"{"profile":["http://example.org/a",null],"_profile":[{"id":"p1"},null]}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("entry 1 of `profile`"), "{}", err);
}

#[test]
fn test_contained_errors_keep_document_positions() {
    let input = concat!(
        "{\n",
        "  \"resourceType\": \"Basic\",\n",
        "  \"contained\": [{\"resourceType\": \"Basic\",\n",
        "    \"bogus\": 1}],\n",
        "  \"code\": {\"text\": \"x\"}\n",
        "}"
    );
    let err = serde_json::from_str::<Basic>(input).unwrap_err();
    assert_eq!(err.line(), 4);
    assert!(err.to_string().starts_with("unknown field `bogus` in Basic"), "{}", err);
}

#[test]
fn test_resource_type_need_not_come_first() {
    let input = r#"{"resourceType":"Basic","contained":[{"id":"s1","resourceType":"SubstanceDefinition","version":"2"}],"code":{"text":"x"}}"#;
    let basic: Basic = serde_json::from_str(input).unwrap();
    match &basic.contained[0] {
        Resource::SubstanceDefinition(substance) => {
            assert_eq!(substance.version, Some(FhirString::from("2")));
        }
        other => panic!("unexpected contained resource {:?}", other),
    }

    let resource: Resource =
        serde_json::from_str(r#"{"code":{"text":"x"},"resourceType":"Basic"}"#).unwrap();
    assert_eq!(resource.resource_type(), "Basic");

    let err = serde_json::from_str::<Basic>(
        r#"{"resourceType":"Basic","contained":[{"id":"s1","resourceType":"Basic","bogus":1}],"code":{"text":"x"}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("unknown field `bogus` in Basic"), "{}", err);
}

#[test]
fn test_encoding_an_empty_required_field_fails() {
    let err = serde_json::to_string(&Basic::default()).unwrap_err();
    assert!(err.to_string().contains("required field Basic.code is empty"));
}
