use fhirkit::*;
use rust_decimal_macros::dec;

fn substance(id: &str, status: &str) -> SubstanceDefinition {
    SubstanceDefinition {
        id: Some(Id::parse(id).unwrap()),
        status: Some(CodeableConcept::text(status)),
        property: vec![SubstanceDefinitionProperty {
            type_: CodeableConcept::text("melting point"),
            value: Some(SubstanceDefinitionPropertyValue::Quantity(Box::new(
                Quantity {
                    value: Some(Decimal::from(dec!(135.0))),
                    code: Some(Code::parse("Cel").unwrap()),
                    ..Default::default()
                },
            ))),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn test_equal_and_equivalent() {
    let a = substance("a", "active");
    let b = substance("b", "active");
    let c = substance("a", "retired");

    assert_eq!(a.as_value().equal(&a.clone().as_value()), Some(true));
    assert!(a.as_value().equivalent(&a.as_value()));

    assert_eq!(a.as_value().equal(&b.as_value()), Some(false));
    assert!(a.as_value().equivalent(&b.as_value()));

    assert_eq!(a.as_value().equal(&c.as_value()), Some(false));
    assert!(!a.as_value().equivalent(&c.as_value()));

    let basic = Basic::default();
    assert_eq!(a.as_value().equal(&basic.as_value()), None);
}

#[test]
fn test_decimal_leaves_compare_by_value() {
    let mut scaled = substance("a", "active");
    if let Some(SubstanceDefinitionPropertyValue::Quantity(quantity)) =
        scaled.property[0].value.as_mut()
    {
        quantity.value = Some(Decimal::from(dec!(135.00)));
    }
    let original = substance("a", "active");
    assert_eq!(original.as_value().equal(&scaled.as_value()), Some(true));
}

#[test]
fn test_empty_list_entries_do_not_affect_equality() {
    let a = substance("a", "active");
    let mut b = a.clone();
    b.classification.push(CodeableConcept::default());
    assert_eq!(a.as_value().equal(&b.as_value()), Some(true));
}

#[test]
fn test_children_order_matches_declaration_and_codec() {
    let built = substance("a", "active");
    let json = serde_json::to_string(&built).unwrap();
    let decoded: SubstanceDefinition = serde_json::from_str(&json).unwrap();

    let names = |s: &SubstanceDefinition| -> Vec<&'static str> {
        s.as_value().children(None).iter().map(|c| c.name).collect()
    };
    assert_eq!(names(&built), vec!["id", "status", "property"]);
    assert_eq!(names(&built), names(&decoded));
    assert_eq!(names(&built), names(&built));
    assert_eq!(built.as_value().equal(&decoded.as_value()), Some(true));
}

#[test]
fn test_selector_keeps_relative_order() {
    let built = substance("a", "active");
    let value = built.as_value();
    let selected = value.children(Some(&["property", "id"]));
    let names: Vec<&str> = selected.iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["id", "property"]);

    let property = selected[1].value;
    let inner = property.children(Some(&["value"]));
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].value.type_name(), "Quantity");

    let quantity = inner[0].value.to_quantity().unwrap();
    assert_eq!(quantity.value, dec!(135.0));
    assert_eq!(quantity.unit, "Cel");
}

#[test]
fn test_composites_are_not_scalars() {
    let built = substance("a", "active");
    let status = built.status.as_ref().unwrap().as_value();
    assert_eq!(
        status.to_string_value(),
        Err(ConversionError::unsupported("CodeableConcept", "String"))
    );
    assert!(status.to_integer().is_err());
    assert!(status.to_decimal().is_err());
    assert!(status.to_date().is_err());
    assert!(status.to_date_time().is_err());
    assert!(status.to_time().is_err());
    assert!(status.to_quantity().is_err());
    assert!(status.to_evaluation_result().is_err());
}

#[test]
fn test_evaluate_builds_objects() {
    let built = substance("a", "active");
    let result = built.as_value().evaluate();
    assert_eq!(
        result.type_info(),
        Some(&TypeInfoResult::fhir("SubstanceDefinition"))
    );
    let status = result.get("status").unwrap();
    assert_eq!(
        status.get("text"),
        Some(&EvaluationResult::String(
            "active".to_string(),
            Some(TypeInfoResult::fhir("string"))
        ))
    );
    assert_eq!(result.get("property").unwrap().count(), 1);
}

#[test]
fn test_static_type_info_without_instance() {
    let info = SubstanceDefinitionMoiety::static_descriptor().class_info();
    assert_eq!(info.qualified_name(), "FHIR.SubstanceDefinition.moiety");
    let amount = info.element("amount").unwrap();
    assert_eq!(amount.type_names, vec!["FHIR.Quantity", "FHIR.string"]);
    assert_eq!(
        registry::class_info("SubstanceDefinition.moiety"),
        Some(info)
    );
}
