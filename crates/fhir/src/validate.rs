//! Structural checks run before encoding.

use thiserror::Error;

use crate::descriptor::{Cardinality, ValueKind};
use crate::element::{Emptiness, FieldRef, ValueRef};

/// A tree that cannot be encoded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{owner}.{field} cannot hold a value of type `{found}`")]
    ChoiceTypeNotAllowed {
        owner: &'static str,
        field: &'static str,
        found: String,
    },
    #[error("required field {owner}.{field} is empty")]
    RequiredFieldEmpty {
        owner: &'static str,
        field: &'static str,
    },
    #[error("{owner}.{field} holds {count} values but allows at most one")]
    MultipleValues {
        owner: &'static str,
        field: &'static str,
        count: usize,
    },
}

/// Walks the whole tree under `value` and reports the first violation.
///
/// Empty values (see [`ValueRef::is_empty`]) count as absent, so a required
/// field holding an empty element is a violation.
pub fn check_encodable(value: ValueRef<'_>) -> Result<(), InvariantViolation> {
    check_value(value, &Emptiness::of(value))
}

fn check_value(value: ValueRef<'_>, emptiness: &Emptiness) -> Result<(), InvariantViolation> {
    let ValueRef::Element(element) = value else {
        return Ok(());
    };
    let descriptor = element.descriptor();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let contents = element.field(index);
        let many = matches!(contents, FieldRef::Many(_));
        let values: Vec<(ValueRef<'_>, &Emptiness)> = contents
            .values()
            .into_iter()
            .zip(emptiness.field(index))
            .filter(|(_, emptiness)| !emptiness.is_empty())
            .collect();

        if values.is_empty() && field.cardinality == Cardinality::Required {
            return Err(InvariantViolation::RequiredFieldEmpty {
                owner: descriptor.name,
                field: field.name,
            });
        }
        if many && !field.is_repeated() && values.len() > 1 {
            return Err(InvariantViolation::MultipleValues {
                owner: descriptor.name,
                field: field.name,
                count: values.len(),
            });
        }
        for (value, emptiness) in values {
            if field.kind == ValueKind::Choice && !field.allows(value.type_name()) {
                return Err(InvariantViolation::ChoiceTypeNotAllowed {
                    owner: descriptor.name,
                    field: field.name,
                    found: value.type_name().to_string(),
                });
            }
            check_value(value, emptiness)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, FhirValue};
    use crate::datatypes::{CodeableConcept, Extension, ExtensionValue, Narrative};
    use crate::primitives::Code;
    use crate::resources::Basic;

    #[test]
    fn test_required_empty_element_is_reported() {
        let basic = Basic::default();
        assert_eq!(
            check_encodable(basic.as_value()),
            Err(InvariantViolation::RequiredFieldEmpty {
                owner: "Basic",
                field: "code"
            })
        );
    }

    #[test]
    fn test_nested_required_primitive_is_reported() {
        let basic = Basic {
            code: CodeableConcept::text("x"),
            text: Some(Narrative {
                status: Code::parse("generated").unwrap(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = check_encodable(basic.as_value()).unwrap_err();
        assert_eq!(err.to_string(), "required field Narrative.div is empty");
    }

    #[test]
    fn test_valid_tree_passes() {
        let basic = Basic {
            code: CodeableConcept::text("x"),
            extension: vec![Extension::new(
                "http://example.org/flag",
                ExtensionValue::Boolean(true.into()),
            )],
            ..Default::default()
        };
        assert_eq!(check_encodable(basic.as_value()), Ok(()));
    }

    #[test]
    fn test_emptiness_lines_up_with_fields() {
        let concept = CodeableConcept {
            coding: vec![Default::default(), Default::default()],
            text: Some("x".into()),
            ..Default::default()
        };
        let coding = concept.descriptor().lookup("coding").unwrap().index;
        let text = concept.descriptor().lookup("text").unwrap().index;

        let emptiness = Emptiness::of(concept.as_value());
        assert!(!emptiness.is_empty());
        assert_eq!(emptiness.field(coding).len(), 2);
        assert!(emptiness.field(coding).iter().all(Emptiness::is_empty));
        assert!(!emptiness.field(text)[0].is_empty());
        assert!(emptiness.field(text)[0].field(0).is_empty());
        assert!(emptiness.field(99).is_empty());

        let bare = CodeableConcept {
            coding: vec![Default::default()],
            ..Default::default()
        };
        assert!(Emptiness::of(bare.as_value()).is_empty());
        assert!(bare.as_value().is_empty());
        assert!(!Emptiness::of(Basic::default().as_value()).is_empty());
    }

    #[test]
    fn test_deeply_nested_extensions_are_checked() {
        let mut extension =
            Extension::new("http://example.org/leaf", ExtensionValue::Boolean(true.into()));
        for depth in 0..64 {
            extension = Extension {
                url: format!("http://example.org/level{}", depth),
                extension: vec![extension],
                ..Default::default()
            };
        }
        let basic = Basic {
            code: CodeableConcept::text("x"),
            extension: vec![extension],
            ..Default::default()
        };
        assert_eq!(check_encodable(basic.as_value()), Ok(()));

        let mut empty = Extension::default();
        for _ in 0..64 {
            empty = Extension {
                extension: vec![empty],
                ..Default::default()
            };
        }
        assert!(Emptiness::of(empty.as_value()).is_empty());
    }
}
