use fhirkit_serde_support::{IdAndExtensionHelper, RawNumber};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::datatypes::Extension;
use crate::descriptor::{Cardinality, FieldDescriptor, TypeDescriptor, ValueKind};
use crate::element::{Element, Emptiness, FieldRef, ValueRef};
use crate::primitives::{PrimitiveElement, Scalar};
use crate::validate::InvariantViolation;

/// Writes an element (or resource) as a JSON object.
pub fn serialize_element<S>(element: &dyn Element, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let emptiness = Emptiness::of(ValueRef::Element(element));
    ElementJson(element, &emptiness).serialize(serializer)
}

/// Writes any value: objects for elements, the bare scalar for primitives.
pub fn serialize_value<S>(value: ValueRef<'_>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ValueJson(value, &Emptiness::of(value)).serialize(serializer)
}

fn write_value<S>(value: ValueRef<'_>, emptiness: &Emptiness, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        ValueRef::Element(element) => ElementJson(element, emptiness).serialize(serializer),
        ValueRef::Primitive(primitive) => match primitive.scalar() {
            Some(scalar) => ScalarJson(scalar).serialize(serializer),
            None => serializer.serialize_none(),
        },
        ValueRef::System(text) => serializer.serialize_str(text),
    }
}

/// An element and the emptiness of everything under it.
struct ElementJson<'a>(&'a dyn Element, &'a Emptiness);

impl Serialize for ElementJson<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let descriptor = self.0.descriptor();
        let mut map = serializer.serialize_map(None)?;
        if descriptor.kind == ValueKind::Resource {
            map.serialize_entry("resourceType", descriptor.name)?;
        }
        for (index, field) in descriptor.fields.iter().enumerate() {
            let contents = self.0.field(index);
            write_field(&mut map, descriptor, field, contents, self.1.field(index))?;
        }
        map.end()
    }
}

fn write_field<M>(
    map: &mut M,
    owner: &TypeDescriptor,
    field: &FieldDescriptor,
    contents: FieldRef<'_>,
    emptiness: &[Emptiness],
) -> Result<(), M::Error>
where
    M: SerializeMap,
{
    let values: Vec<(ValueRef<'_>, &Emptiness)> = contents
        .values()
        .into_iter()
        .zip(emptiness)
        .filter(|(_, emptiness)| !emptiness.is_empty())
        .collect();

    if values.is_empty() {
        if field.cardinality == Cardinality::Required {
            return Err(M::Error::custom(InvariantViolation::RequiredFieldEmpty {
                owner: owner.name,
                field: field.name,
            }));
        }
        return Ok(());
    }

    if field.is_repeated() {
        return write_list(map, owner, field, &values);
    }
    if values.len() > 1 {
        return Err(M::Error::custom(InvariantViolation::MultipleValues {
            owner: owner.name,
            field: field.name,
            count: values.len(),
        }));
    }
    write_single(map, owner, field, values[0])
}

fn write_single<M>(
    map: &mut M,
    owner: &TypeDescriptor,
    field: &FieldDescriptor,
    (value, emptiness): (ValueRef<'_>, &Emptiness),
) -> Result<(), M::Error>
where
    M: SerializeMap,
{
    let type_name = value.type_name();
    if field.is_choice() && !field.allows(type_name) {
        return Err(M::Error::custom(InvariantViolation::ChoiceTypeNotAllowed {
            owner: owner.name,
            field: field.name,
            found: type_name.to_string(),
        }));
    }
    let name = field.wire_name(type_name);
    match value {
        ValueRef::Primitive(primitive) => {
            if let Some(scalar) = primitive.scalar() {
                map.serialize_entry(name.as_ref(), &ScalarJson(scalar))?;
            }
            if primitive.has_metadata() {
                map.serialize_entry(&format!("_{}", name), &metadata(primitive))?;
            }
        }
        ValueRef::Element(element) => {
            map.serialize_entry(name.as_ref(), &ElementJson(element, emptiness))?
        }
        ValueRef::System(text) => map.serialize_entry(name.as_ref(), text)?,
    }
    Ok(())
}

fn write_list<M>(
    map: &mut M,
    owner: &TypeDescriptor,
    field: &FieldDescriptor,
    values: &[(ValueRef<'_>, &Emptiness)],
) -> Result<(), M::Error>
where
    M: SerializeMap,
{
    if field.is_choice() {
        return Err(M::Error::custom(format_args!(
            "repeated choice field `{}.{}` cannot be written",
            owner.name, field.name
        )));
    }

    let primitives: Vec<&dyn PrimitiveElement> = values
        .iter()
        .filter_map(|(v, _)| match v {
            ValueRef::Primitive(p) => Some(*p),
            _ => None,
        })
        .collect();
    if primitives.len() != values.len() {
        return map.serialize_entry(field.name, &ValueList(values));
    }

    if primitives.iter().any(|p| p.scalar().is_some()) {
        map.serialize_entry(field.name, &PrimitiveValues(&primitives))?;
    }
    if primitives.iter().any(|p| p.has_metadata()) {
        map.serialize_entry(&format!("_{}", field.name), &PrimitiveMetadata(&primitives))?;
    }
    Ok(())
}

fn metadata(primitive: &dyn PrimitiveElement) -> IdAndExtensionHelper<'_, Extension> {
    IdAndExtensionHelper {
        id: primitive.id(),
        extension: primitive.extension(),
    }
}

struct ScalarJson<'a>(Scalar<'a>);

impl Serialize for ScalarJson<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Scalar::Boolean(b) => serializer.serialize_bool(b),
            Scalar::Integer(i) => serializer.serialize_i64(i),
            Scalar::Decimal(d) => RawNumber(d.original_string()).serialize(serializer),
            Scalar::Text(text) => serializer.serialize_str(text),
        }
    }
}

struct ValueList<'a>(&'a [(ValueRef<'a>, &'a Emptiness)]);

impl Serialize for ValueList<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for &(value, emptiness) in self.0 {
            seq.serialize_element(&ValueJson(value, emptiness))?;
        }
        seq.end()
    }
}

struct ValueJson<'a>(ValueRef<'a>, &'a Emptiness);

impl Serialize for ValueJson<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        write_value(self.0, self.1, serializer)
    }
}

/// `"x": [v1, null, v3]`
struct PrimitiveValues<'a>(&'a [&'a dyn PrimitiveElement]);

impl Serialize for PrimitiveValues<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for primitive in self.0 {
            seq.serialize_element(&primitive.scalar().map(ScalarJson))?;
        }
        seq.end()
    }
}

/// `"_x": [null, {"id": ..}, null]`
struct PrimitiveMetadata<'a>(&'a [&'a dyn PrimitiveElement]);

impl Serialize for PrimitiveMetadata<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for primitive in self.0 {
            let entry = primitive.has_metadata().then(|| metadata(*primitive));
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}
