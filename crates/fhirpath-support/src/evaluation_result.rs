use rust_decimal::Decimal;

use crate::type_info::TypeInfoResult;

/// A decimal magnitude with its unit, as produced by `to_quantity`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityValue {
    pub value: Decimal,
    pub unit: String,
}

/// A FHIRPath value.
///
/// Scalars carry the model type they were produced from (e.g. `FHIR.code` for
/// a `String`), so an evaluator can answer `is`/`as` questions without going
/// back to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    Empty,
    Boolean(bool, Option<TypeInfoResult>),
    String(String, Option<TypeInfoResult>),
    Integer(i64, Option<TypeInfoResult>),
    Decimal(Decimal, Option<TypeInfoResult>),
    Date(String, Option<TypeInfoResult>),
    DateTime(String, Option<TypeInfoResult>),
    Time(String, Option<TypeInfoResult>),
    Quantity(Decimal, String, Option<TypeInfoResult>),
    Collection {
        items: Vec<EvaluationResult>,
        has_undefined_order: bool,
        type_info: Option<TypeInfoResult>,
    },
    /// A complex value; fields keep the declaration order of the model type.
    Object {
        fields: Vec<(String, EvaluationResult)>,
        type_info: Option<TypeInfoResult>,
    },
}

impl EvaluationResult {
    pub fn collection(items: Vec<EvaluationResult>) -> Self {
        EvaluationResult::Collection {
            items,
            has_undefined_order: false,
            type_info: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            EvaluationResult::Empty => true,
            EvaluationResult::Collection { items, .. } => items.is_empty(),
            _ => false,
        }
    }

    /// Number of items this value contributes to a FHIRPath collection.
    pub fn count(&self) -> usize {
        match self {
            EvaluationResult::Empty => 0,
            EvaluationResult::Collection { items, .. } => items.len(),
            _ => 1,
        }
    }

    pub fn type_info(&self) -> Option<&TypeInfoResult> {
        match self {
            EvaluationResult::Empty => None,
            EvaluationResult::Boolean(_, t)
            | EvaluationResult::String(_, t)
            | EvaluationResult::Integer(_, t)
            | EvaluationResult::Decimal(_, t)
            | EvaluationResult::Date(_, t)
            | EvaluationResult::DateTime(_, t)
            | EvaluationResult::Time(_, t)
            | EvaluationResult::Quantity(_, _, t) => t.as_ref(),
            EvaluationResult::Collection { type_info, .. }
            | EvaluationResult::Object { type_info, .. } => type_info.as_ref(),
        }
    }

    /// Looks up a field of an `Object` value.
    pub fn get(&self, name: &str) -> Option<&EvaluationResult> {
        match self {
            EvaluationResult::Object { fields, .. } => {
                fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// The FHIRPath system type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            EvaluationResult::Empty => "Empty",
            EvaluationResult::Boolean(..) => "Boolean",
            EvaluationResult::String(..) => "String",
            EvaluationResult::Integer(..) => "Integer",
            EvaluationResult::Decimal(..) => "Decimal",
            EvaluationResult::Date(..) => "Date",
            EvaluationResult::DateTime(..) => "DateTime",
            EvaluationResult::Time(..) => "Time",
            EvaluationResult::Quantity(..) => "Quantity",
            EvaluationResult::Collection { .. } => "Collection",
            EvaluationResult::Object { .. } => "Object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_count() {
        assert!(EvaluationResult::Empty.is_empty());
        assert!(EvaluationResult::collection(vec![]).is_empty());
        assert_eq!(
            EvaluationResult::collection(vec![
                EvaluationResult::Boolean(true, None),
                EvaluationResult::Integer(1, None),
            ])
            .count(),
            2
        );
        assert_eq!(EvaluationResult::String("x".into(), None).count(), 1);
    }

    #[test]
    fn test_object_field_lookup() {
        let object = EvaluationResult::Object {
            fields: vec![(
                "text".to_string(),
                EvaluationResult::String("x".to_string(), None),
            )],
            type_info: Some(TypeInfoResult::fhir("CodeableConcept")),
        };
        assert_eq!(
            object.get("text"),
            Some(&EvaluationResult::String("x".to_string(), None))
        );
        assert!(object.get("coding").is_none());
        assert_eq!(object.type_info().map(|t| t.name.as_str()), Some("CodeableConcept"));
    }
}
