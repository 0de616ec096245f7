//! The reflective traversal protocol consumed by FHIRPath evaluators.
//!
//! Everything here works on [`ValueRef`], so an evaluator can walk any tree
//! without knowing its concrete types: `children` for navigation,
//! `type_info` for `is`/`as`/`ofType`, `equal`/`equivalent` for `=`/`~`, and
//! the `to_*` methods for the conversion functions.

use std::borrow::Cow;
use std::str::FromStr;

use fhirkit_fhirpath_support::{
    ClassInfo, ClassInfoElement, ConversionError, EvaluationResult, QuantityValue, TypeInfoResult,
};
use rust_decimal::Decimal;

use crate::element::{Element, Emptiness, ValueRef};
use crate::primitives::{Scalar, is_date, is_date_time, is_time, system_type_name};

/// One populated child: the logical field name and the value.
#[derive(Debug, Clone, Copy)]
pub struct Child<'a> {
    pub name: &'static str,
    pub value: ValueRef<'a>,
}

impl<'a> ValueRef<'a> {
    /// Populated children in declaration order, optionally restricted to the
    /// named fields.
    ///
    /// Repeated fields expand in order; absent and empty values contribute
    /// nothing. A primitive's children are its `id` and its extensions.
    pub fn children(&self, selector: Option<&[&str]>) -> Vec<Child<'a>> {
        let wanted = |name: &str| selector.is_none_or(|names| names.contains(&name));
        let mut children = Vec::new();
        match *self {
            ValueRef::Primitive(primitive) => {
                if let Some(id) = primitive.id().filter(|_| wanted("id")) {
                    children.push(Child {
                        name: "id",
                        value: ValueRef::System(id),
                    });
                }
                if wanted("extension") {
                    children.extend(primitive.extension().iter().map(|extension| Child {
                        name: "extension",
                        value: ValueRef::Element(extension),
                    }));
                }
            }
            ValueRef::Element(element) => {
                for (index, field) in element.descriptor().fields.iter().enumerate() {
                    if !wanted(field.name) {
                        continue;
                    }
                    children.extend(
                        element
                            .field(index)
                            .values()
                            .into_iter()
                            .filter(|v| !v.is_empty())
                            .map(|value| Child {
                                name: field.name,
                                value,
                            }),
                    );
                }
            }
            ValueRef::System(_) => {}
        }
        children
    }

    /// Static class info of the value's concrete type.
    pub fn type_info(&self) -> ClassInfo {
        match self {
            ValueRef::Primitive(p) => primitive_class_info(p.type_name()),
            ValueRef::Element(e) => e.descriptor().class_info(),
            ValueRef::System(_) => ClassInfo {
                namespace: "System".to_string(),
                name: "String".to_string(),
                base_type: None,
                elements: Vec::new(),
            },
        }
    }

    /// Structural equality; `None` when the two values have different types.
    pub fn equal(&self, other: &ValueRef<'_>) -> Option<bool> {
        if self.type_name() != other.type_name() {
            return None;
        }
        equal_in(
            (*self, &Emptiness::of(*self)),
            (*other, &Emptiness::of(*other)),
            false,
        )
    }

    /// Equality that ignores the top-level id on both sides.
    pub fn equivalent(&self, other: &ValueRef<'_>) -> bool {
        if self.type_name() != other.type_name() {
            return false;
        }
        equal_in(
            (*self, &Emptiness::of(*self)),
            (*other, &Emptiness::of(*other)),
            true,
        ) == Some(true)
    }

    pub fn to_boolean(&self) -> Result<bool, ConversionError> {
        match self.scalar() {
            Some(Scalar::Boolean(b)) => Ok(b),
            Some(Scalar::Integer(1)) => Ok(true),
            Some(Scalar::Integer(0)) => Ok(false),
            Some(Scalar::Decimal(d)) if d.value() == Decimal::ONE => Ok(true),
            Some(Scalar::Decimal(d)) if d.value().is_zero() => Ok(false),
            Some(Scalar::Text(text)) => match text.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "1.0" => Ok(true),
                "false" | "f" | "no" | "n" | "0" | "0.0" => Ok(false),
                _ => Err(self.out_of_range("Boolean")),
            },
            Some(_) => Err(self.out_of_range("Boolean")),
            None => Err(self.unsupported("Boolean")),
        }
    }

    /// The string form of a scalar; quantities render as `value 'unit'`.
    pub fn to_string_value(&self) -> Result<String, ConversionError> {
        if let Some(scalar) = self.scalar() {
            return Ok(scalar.to_text().into_owned());
        }
        let quantity = self.to_quantity().map_err(|_| self.unsupported("String"))?;
        Ok(format!("{} '{}'", quantity.value, quantity.unit))
    }

    pub fn to_integer(&self) -> Result<i64, ConversionError> {
        match self.scalar() {
            Some(Scalar::Integer(i)) => Ok(i),
            Some(Scalar::Boolean(b)) => Ok(i64::from(b)),
            Some(Scalar::Text(text)) => text.parse().map_err(|_| self.out_of_range("Integer")),
            _ => Err(self.unsupported("Integer")),
        }
    }

    pub fn to_decimal(&self) -> Result<Decimal, ConversionError> {
        match self.scalar() {
            Some(Scalar::Decimal(d)) => Ok(d.value()),
            Some(Scalar::Integer(i)) => Ok(Decimal::from(i)),
            Some(Scalar::Boolean(b)) => Ok(if b { Decimal::ONE } else { Decimal::ZERO }),
            Some(Scalar::Text(text)) => {
                Decimal::from_str(text).map_err(|_| self.out_of_range("Decimal"))
            }
            None => Err(self.unsupported("Decimal")),
        }
    }

    /// The date part of a `date`, `dateTime` or `instant`, or a string
    /// holding a date.
    pub fn to_date(&self) -> Result<String, ConversionError> {
        match (self.type_name(), self.scalar()) {
            ("date" | "dateTime" | "instant", Some(Scalar::Text(text))) => {
                Ok(text.split('T').next().unwrap_or(text).to_string())
            }
            (_, Some(Scalar::Text(text))) if is_date(text) => Ok(text.to_string()),
            (_, Some(_)) => Err(self.out_of_range("Date")),
            (_, None) => Err(self.unsupported("Date")),
        }
    }

    pub fn to_date_time(&self) -> Result<String, ConversionError> {
        match (self.type_name(), self.scalar()) {
            ("date" | "dateTime" | "instant", Some(Scalar::Text(text))) => Ok(text.to_string()),
            (_, Some(Scalar::Text(text))) if is_date_time(text) => Ok(text.to_string()),
            (_, Some(_)) => Err(self.out_of_range("DateTime")),
            (_, None) => Err(self.unsupported("DateTime")),
        }
    }

    pub fn to_time(&self) -> Result<String, ConversionError> {
        match self.scalar() {
            Some(Scalar::Text(text)) if is_time(text) => Ok(text.to_string()),
            Some(_) => Err(self.out_of_range("Time")),
            None => Err(self.unsupported("Time")),
        }
    }

    /// Numbers convert with unit `1`; a `Quantity` element uses its `code`,
    /// falling back to its `unit`.
    pub fn to_quantity(&self) -> Result<QuantityValue, ConversionError> {
        match self {
            ValueRef::Element(element) if element.descriptor().name == "Quantity" => {
                let value = match scalar_field(*element, "value") {
                    Some(Scalar::Decimal(d)) => d.value(),
                    _ => return Err(self.out_of_range("Quantity")),
                };
                let unit = match scalar_field(*element, "code").or_else(|| scalar_field(*element, "unit")) {
                    Some(scalar) => scalar.to_text().into_owned(),
                    None => "1".to_string(),
                };
                Ok(QuantityValue { value, unit })
            }
            _ => match self.scalar() {
                Some(Scalar::Integer(_) | Scalar::Decimal(_)) => Ok(QuantityValue {
                    value: self.to_decimal()?,
                    unit: "1".to_string(),
                }),
                Some(Scalar::Text(text)) => {
                    parse_quantity(text).ok_or_else(|| self.out_of_range("Quantity"))
                }
                Some(Scalar::Boolean(_)) => Err(self.out_of_range("Quantity")),
                None => Err(self.unsupported("Quantity")),
            },
        }
    }

    /// The scalar as an evaluator value, tagged with its FHIR type.
    ///
    /// A primitive with no value is `Empty`; a `Quantity` element becomes a
    /// quantity. Other composites are not scalars.
    pub fn to_evaluation_result(&self) -> Result<EvaluationResult, ConversionError> {
        match self {
            ValueRef::Primitive(p) => Ok(p.to_evaluation_result().unwrap_or(EvaluationResult::Empty)),
            ValueRef::System(s) => Ok(EvaluationResult::String(
                s.to_string(),
                Some(TypeInfoResult::system("String")),
            )),
            ValueRef::Element(e) if e.descriptor().name == "Quantity" => {
                let quantity = self.to_quantity()?;
                Ok(EvaluationResult::Quantity(
                    quantity.value,
                    quantity.unit,
                    Some(TypeInfoResult::fhir("Quantity")),
                ))
            }
            ValueRef::Element(_) => Err(self.unsupported("EvaluationResult")),
        }
    }

    /// The whole subtree as an evaluator value: scalars as in
    /// [`to_evaluation_result`](Self::to_evaluation_result), composites as
    /// `Object`s whose repeated fields are collections.
    pub fn evaluate(&self) -> EvaluationResult {
        evaluate_in(*self, &Emptiness::of(*self))
    }

    fn scalar(&self) -> Option<Scalar<'a>> {
        match *self {
            ValueRef::Primitive(p) => p.scalar(),
            ValueRef::System(s) => Some(Scalar::Text(s)),
            ValueRef::Element(_) => None,
        }
    }

    fn unsupported(&self, to: &'static str) -> ConversionError {
        ConversionError::unsupported(self.type_name(), to)
    }

    fn out_of_range(&self, to: &'static str) -> ConversionError {
        ConversionError::OutOfRange {
            from: self.type_name().to_string(),
            to,
            value: self.scalar().map(|s| s.to_text().into_owned()).unwrap_or_default(),
        }
    }
}

fn evaluate_in(value: ValueRef<'_>, emptiness: &Emptiness) -> EvaluationResult {
    if let Ok(result) = value.to_evaluation_result() {
        return result;
    }
    let ValueRef::Element(element) = value else {
        return EvaluationResult::Empty;
    };
    let descriptor = element.descriptor();
    let mut fields = Vec::new();
    for (index, field) in descriptor.fields.iter().enumerate() {
        let values: Vec<EvaluationResult> = element
            .field(index)
            .values()
            .into_iter()
            .zip(emptiness.field(index))
            .filter(|(_, emptiness)| !emptiness.is_empty())
            .map(|(value, emptiness)| evaluate_in(value, emptiness))
            .collect();
        let value = match values.len() {
            0 => continue,
            1 if !field.is_repeated() => values.into_iter().next().unwrap_or(EvaluationResult::Empty),
            _ => EvaluationResult::collection(values),
        };
        fields.push((field.name.to_string(), value));
    }
    EvaluationResult::Object {
        fields,
        type_info: Some(TypeInfoResult::fhir(descriptor.name)),
    }
}

type Measured<'v, 'e> = (ValueRef<'v>, &'e Emptiness);

fn equal_in(a: Measured<'_, '_>, b: Measured<'_, '_>, skip_id: bool) -> Option<bool> {
    if a.0.type_name() != b.0.type_name() {
        return None;
    }
    Some(match (a.0, b.0) {
        (ValueRef::System(x), ValueRef::System(y)) => x == y,
        (ValueRef::Primitive(x), ValueRef::Primitive(y)) => {
            x.scalar() == y.scalar() && same_children(a, b, skip_id)
        }
        _ => same_children(a, b, skip_id),
    })
}

fn same_children(a: Measured<'_, '_>, b: Measured<'_, '_>, skip_id: bool) -> bool {
    let keep = |entry: &(Child<'_>, Cow<'_, Emptiness>)| !(skip_id && entry.0.name == "id");
    let left: Vec<_> = populated(a).into_iter().filter(keep).collect();
    let right: Vec<_> = populated(b).into_iter().filter(keep).collect();
    left.len() == right.len()
        && left.iter().zip(&right).all(|((l, l_empty), (r, r_empty))| {
            l.name == r.name && equal_in((l.value, &**l_empty), (r.value, &**r_empty), false) == Some(true)
        })
}

/// [`ValueRef::children`] with the emptiness of each child alongside.
fn populated<'v, 'e>((value, emptiness): Measured<'v, 'e>) -> Vec<(Child<'v>, Cow<'e, Emptiness>)> {
    let mut children = Vec::new();
    match value {
        ValueRef::Primitive(primitive) => {
            if let Some(id) = primitive.id() {
                let value = ValueRef::System(id);
                children.push((Child { name: "id", value }, Cow::Owned(Emptiness::of(value))));
            }
            for extension in primitive.extension() {
                let value = ValueRef::Element(extension);
                children.push((
                    Child {
                        name: "extension",
                        value,
                    },
                    Cow::Owned(Emptiness::of(value)),
                ));
            }
        }
        ValueRef::Element(element) => {
            for (index, field) in element.descriptor().fields.iter().enumerate() {
                let values = element.field(index).values().into_iter();
                for (value, emptiness) in values.zip(emptiness.field(index)) {
                    if !emptiness.is_empty() {
                        children.push((
                            Child {
                                name: field.name,
                                value,
                            },
                            Cow::Borrowed(emptiness),
                        ));
                    }
                }
            }
        }
        ValueRef::System(_) => {}
    }
    children
}

fn scalar_field<'a>(element: &'a dyn Element, name: &str) -> Option<Scalar<'a>> {
    let index = element.descriptor().field_index(name)?;
    element.field(index).values().into_iter().find_map(|v| match v {
        ValueRef::Primitive(p) => p.scalar(),
        _ => None,
    })
}

/// `1.5 'mg'`, `1.5 mg` or a bare number.
fn parse_quantity(text: &str) -> Option<QuantityValue> {
    let text = text.trim();
    let (number, unit) = match text.split_once(' ') {
        Some((number, unit)) => (number, unit.trim().trim_matches('\'')),
        None => (text, "1"),
    };
    let value = Decimal::from_str(number).ok()?;
    (!unit.is_empty()).then(|| QuantityValue {
        value,
        unit: unit.to_string(),
    })
}

/// Class info for a primitive: `id` and `extension` plus the system-typed
/// `value`.
pub(crate) fn primitive_class_info(type_name: &str) -> ClassInfo {
    ClassInfo {
        namespace: "FHIR".to_string(),
        name: type_name.to_string(),
        base_type: Some("FHIR.PrimitiveType".to_string()),
        elements: vec![
            ClassInfoElement {
                name: "id".to_string(),
                type_names: vec!["System.String".to_string()],
                is_list: false,
            },
            ClassInfoElement {
                name: "extension".to_string(),
                type_names: vec!["FHIR.Extension".to_string()],
                is_list: true,
            },
            ClassInfoElement {
                name: "value".to_string(),
                type_names: vec![format!("System.{}", system_type_name(type_name))],
                is_list: false,
            },
        ],
    }
}
