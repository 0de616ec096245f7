use std::fmt;
use std::marker::PhantomData;

use fhirkit_serde_support::{JsonPrimitive, split_metadata_key};
use serde::Deserialize;
use serde::de::{
    DeserializeSeed, Deserializer, Error as _, MapAccess, SeqAccess, Unexpected, Visitor,
};
use serde_json::value::RawValue;

use crate::descriptor::{FieldDescriptor, TypeDescriptor, ValueKind, choice_wire_name};
use crate::element::{
    Element, FhirValue, FieldMut, OptionalSlot, RepeatedSlot, RequiredSlot, ValueMut,
};
use crate::primitives::{JsonScalar, PrimitiveElement, PrimitiveError};

/// Fills `target` from a JSON object.
///
/// `target` normally starts out as `Default::default()`; fields that are
/// absent from the input are left as they are.
pub fn deserialize_element<'de, D>(target: &mut dyn Element, deserializer: D) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    ElementSeed { target, path: None }.deserialize(deserializer)
}

/// Reads a resource whose concrete type is chosen by its `resourceType`.
pub fn deserialize_resource<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FhirValue,
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(ResourceVisitor(PhantomData))
}

/// The property being read and the type that owns it.
///
/// Messages built from a path end in ` in <Owner>`, which is how callers
/// recover the enclosing element from a `serde_json` error.
#[derive(Debug, Clone, Copy)]
struct FieldPath<'k> {
    key: &'k str,
    owner: &'static str,
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` in {}", self.key, self.owner)
    }
}

/// ` for <path>`, or nothing at the document root.
struct ForPath<'a, 'k>(Option<&'a FieldPath<'k>>);

impl fmt::Display for ForPath<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, " for {}", path),
            None => Ok(()),
        }
    }
}

fn unknown_resource<E: serde::de::Error>(resource_type: &str, path: Option<&FieldPath<'_>>) -> E {
    E::custom(format_args!(
        "unknown resource type `{}`{}",
        resource_type,
        ForPath(path)
    ))
}

fn unknown_field<E: serde::de::Error>(key: &str, owner: &TypeDescriptor) -> E {
    E::custom(format_args!("unknown field `{}` in {}", key, owner.name))
}

fn cannot_create<E: serde::de::Error>(type_name: &str, path: &FieldPath<'_>) -> E {
    E::custom(format_args!("cannot create a {} value for {}", type_name, path))
}

/// Moves a nested `serde_json` error into the outer deserializer, dropping
/// the position that was relative to the nested text.
fn relocate<E: serde::de::Error>(err: serde_json::Error) -> E {
    let message = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    match message.strip_suffix(&suffix) {
        Some(stripped) => E::custom(stripped),
        None => E::custom(message),
    }
}

struct ElementSeed<'a, 'k> {
    target: &'a mut dyn Element,
    path: Option<FieldPath<'k>>,
}

impl<'de> DeserializeSeed<'de> for ElementSeed<'_, '_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ElementVisitor {
            target: self.target,
            path: self.path,
        })
    }
}

/// What has been read so far for one field.
#[derive(Debug, Default, Clone)]
struct FieldState {
    value_seen: bool,
    metadata_seen: bool,
    choice: Option<&'static str>,
    /// Entry-by-entry presence in the `x` and `_x` arrays of a repeated field.
    values: Vec<bool>,
    metadata: Vec<bool>,
}

struct ElementVisitor<'a, 'k> {
    target: &'a mut dyn Element,
    path: Option<FieldPath<'k>>,
}

impl<'de> Visitor<'de> for ElementVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "a {} object{}",
            self.target.descriptor().name,
            ForPath(self.path.as_ref())
        )
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        read_fields(self.target, &mut map, false)
    }
}

/// Reads the remaining entries of `map` into `target`.
fn read_fields<'de, A>(
    target: &mut dyn Element,
    map: &mut A,
    mut resource_type_seen: bool,
) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
{
    let descriptor = target.descriptor();
    let mut states = vec![FieldState::default(); descriptor.fields.len()];

    while let Some(key) = map.next_key::<String>()? {
        if key == "resourceType" && descriptor.kind == ValueKind::Resource {
            if resource_type_seen {
                return Err(A::Error::custom(format_args!(
                    "duplicate field `resourceType` in {}",
                    descriptor.name
                )));
            }
            resource_type_seen = true;
            let declared: String = map.next_value()?;
            if declared != descriptor.name {
                tracing::debug!(
                    declared = %declared,
                    expected = descriptor.name,
                    "ignoring resourceType of a concretely typed resource"
                );
            }
            continue;
        }

        let (metadata, name) = split_metadata_key(&key);
        let Some(wire) = descriptor.lookup(name) else {
            return Err(unknown_field(&key, descriptor));
        };
        let field = &descriptor.fields[wire.index];
        if metadata && !accepts_metadata(field.kind, wire.choice_type) {
            return Err(unknown_field(&key, descriptor));
        }

        let state = &mut states[wire.index];
        if let Some(choice_type) = wire.choice_type {
            match state.choice {
                Some(previous) if previous != choice_type => {
                    return Err(A::Error::custom(format_args!(
                        "duplicate choice field value: `{}` conflicts with `{}` in {}",
                        key,
                        choice_wire_name(field.name, previous),
                        descriptor.name
                    )));
                }
                _ => state.choice = Some(choice_type),
            }
        }
        let fresh = !state.value_seen && !state.metadata_seen;
        let seen = if metadata {
            &mut state.metadata_seen
        } else {
            &mut state.value_seen
        };
        if *seen {
            return Err(A::Error::custom(format_args!(
                "duplicate field `{}` in {}",
                key, descriptor.name
            )));
        }
        *seen = true;

        let type_name = wire
            .choice_type
            .or_else(|| field.types.first().copied())
            .unwrap_or_default();
        tracing::trace!(owner = descriptor.name, key = %key, type_name, "reading field");

        let path = FieldPath {
            key: &key,
            owner: descriptor.name,
        };
        let Some(slot) = target.field_mut(wire.index) else {
            return Err(unknown_field(&key, descriptor));
        };
        match slot {
            FieldMut::Attribute(slot) => slot.set(map.next_value_seed(TextSeed(path))?),
            FieldMut::Optional(slot) if field.kind == ValueKind::Resource => {
                map.next_value_seed(ResourceSeed {
                    slot: ResourceSlot::Optional(slot),
                    path,
                })?;
            }
            FieldMut::Required(slot) if field.kind == ValueKind::Resource => {
                map.next_value_seed(ResourceSeed {
                    slot: ResourceSlot::Required(slot),
                    path,
                })?;
            }
            FieldMut::Repeated(slot) if field.kind == ValueKind::Resource => {
                map.next_value_seed(ResourceListSeed { slot, path })?;
            }
            FieldMut::Optional(slot) => {
                let value = if fresh {
                    slot.reset(type_name)
                } else {
                    slot.value_mut()
                };
                let value = value.ok_or_else(|| cannot_create::<A::Error>(type_name, &path))?;
                map.next_value_seed(ValueSeed {
                    value,
                    metadata,
                    in_list: false,
                    path,
                })?;
            }
            FieldMut::Required(slot) => {
                let value = if fresh {
                    slot.reset(type_name)
                } else {
                    Some(slot.value_mut())
                };
                let value = value.ok_or_else(|| cannot_create::<A::Error>(type_name, &path))?;
                map.next_value_seed(ValueSeed {
                    value,
                    metadata,
                    in_list: false,
                    path,
                })?;
            }
            FieldMut::Repeated(slot) => {
                let present = map.next_value_seed(ListSeed {
                    slot,
                    metadata,
                    type_name,
                    path,
                })?;
                let state = &mut states[wire.index];
                if metadata {
                    state.metadata = present;
                } else {
                    state.values = present;
                }
            }
        }
    }

    for (field, state) in descriptor.fields.iter().zip(&states) {
        check_alignment::<A::Error>(field, state, descriptor)?;
    }
    Ok(())
}

/// `x` and `_x` arrays pair up by index: same length, and every index has a
/// value, metadata or both.
fn check_alignment<E: serde::de::Error>(
    field: &FieldDescriptor,
    state: &FieldState,
    owner: &TypeDescriptor,
) -> Result<(), E> {
    if state.value_seen && state.metadata_seen && state.values.len() != state.metadata.len() {
        return Err(E::custom(format_args!(
            "`{}` has {} entries but `_{}` has {} in {}",
            field.name,
            state.values.len(),
            field.name,
            state.metadata.len(),
            owner.name
        )));
    }
    let len = state.values.len().max(state.metadata.len());
    let missing = (0..len).find(|&index| {
        !state.values.get(index).copied().unwrap_or(false)
            && !state.metadata.get(index).copied().unwrap_or(false)
    });
    match missing {
        Some(index) => Err(E::custom(format_args!(
            "entry {} of `{}` has neither a value nor metadata in {}",
            index, field.name, owner.name
        ))),
        None => Ok(()),
    }
}

/// `_x` siblings exist only for primitive values.
fn accepts_metadata(kind: ValueKind, choice_type: Option<&str>) -> bool {
    match kind {
        ValueKind::Primitive => true,
        ValueKind::Choice => choice_type
            .and_then(|t| t.chars().next())
            .is_some_and(|c| c.is_ascii_lowercase()),
        _ => false,
    }
}

/// An attribute string such as `Extension.url`, or a metadata `id`.
struct TextSeed<'k>(FieldPath<'k>);

impl<'de> DeserializeSeed<'de> for TextSeed<'_> {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_string(self)
    }
}

impl<'de> Visitor<'de> for TextSeed<'_> {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a string for {}", self.0)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }
}

/// One value; `metadata` selects the `_x` half of a primitive.
///
/// Yields whether anything was present, which is `false` only for a `null`
/// entry of an aligned array.
struct ValueSeed<'a, 'k> {
    value: ValueMut<'a>,
    metadata: bool,
    /// Inside an aligned array, where `null` marks an absent entry.
    in_list: bool,
    path: FieldPath<'k>,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_, '_> {
    type Value = bool;

    fn deserialize<D>(self, deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ValueSeed {
            value,
            metadata,
            in_list,
            path,
        } = self;
        match (value, metadata) {
            (ValueMut::Primitive(primitive), true) => deserializer.deserialize_option(MetadataVisitor {
                primitive,
                in_list,
                path,
            }),
            (ValueMut::Primitive(primitive), false) => {
                let raw = Box::<RawValue>::deserialize(deserializer)?;
                let expected = format!("a {} value for {}", primitive.type_name(), path);
                match JsonPrimitive::from_raw::<D::Error>(&raw, &expected.as_str())? {
                    JsonPrimitive::Null if in_list => Ok(false),
                    JsonPrimitive::Null => Err(D::Error::custom(format_args!(
                        "null is not a valid {} value for {}",
                        primitive.type_name(),
                        path
                    ))),
                    token => {
                        apply_token(primitive, token)
                            .map_err(|e| D::Error::custom(format_args!("{} for {}", e, path)))?;
                        Ok(true)
                    }
                }
            }
            (ValueMut::Element(element), true) => Err(D::Error::custom(format_args!(
                "unexpected metadata object of type {} for {}",
                element.descriptor().name,
                path
            ))),
            (ValueMut::Element(element), false) => {
                ElementSeed {
                    target: element,
                    path: Some(path),
                }
                .deserialize(deserializer)?;
                Ok(true)
            }
        }
    }
}

fn apply_token(primitive: &mut dyn PrimitiveElement, token: JsonPrimitive) -> Result<(), PrimitiveError> {
    match token {
        JsonPrimitive::Bool(b) => primitive.set_json(JsonScalar::Bool(b)),
        JsonPrimitive::Number(n) => primitive.set_json(JsonScalar::Number(&n)),
        JsonPrimitive::String(s) => primitive.set_json(JsonScalar::String(&s)),
        JsonPrimitive::Null => Ok(()),
    }
}

/// The `_x` object of a primitive: `id` and `extension`, nothing else.
struct MetadataVisitor<'a, 'k> {
    primitive: &'a mut dyn PrimitiveElement,
    in_list: bool,
    path: FieldPath<'k>,
}

impl<'de> Visitor<'de> for MetadataVisitor<'_, '_> {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a metadata object for {}", self.path)
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<bool, E> {
        if self.in_list {
            Ok(false)
        } else {
            Err(E::invalid_type(Unexpected::Unit, &self))
        }
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<bool, E> {
        self.visit_none()
    }

    fn visit_some<D>(self, deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A>(self, mut map: A) -> Result<bool, A::Error>
    where
        A: MapAccess<'de>,
    {
        let MetadataVisitor {
            primitive, path, ..
        } = self;
        let mut id_seen = false;
        let mut extension_seen = false;
        while let Some(key) = map.next_key::<String>()? {
            let seen = match key.as_str() {
                "id" => &mut id_seen,
                "extension" => &mut extension_seen,
                _ => {
                    return Err(A::Error::custom(format_args!(
                        "unknown field `{}` in the metadata of {}",
                        key, path
                    )));
                }
            };
            if *seen {
                return Err(A::Error::custom(format_args!(
                    "duplicate field `{}` in the metadata of {}",
                    key, path
                )));
            }
            *seen = true;

            if key == "id" {
                let id = map.next_value_seed(TextSeed(path))?;
                primitive.set_id(Some(id));
            } else {
                map.next_value_seed(ListSeed {
                    slot: primitive.extension_mut(),
                    metadata: false,
                    type_name: "Extension",
                    path,
                })?;
            }
        }
        Ok(true)
    }
}

/// A JSON array merged index-by-index into a repeated field, so that `x` and
/// `_x` arrays can arrive in either order.
struct ListSeed<'a, 'k> {
    slot: &'a mut dyn RepeatedSlot,
    metadata: bool,
    type_name: &'static str,
    path: FieldPath<'k>,
}

impl<'de> DeserializeSeed<'de> for ListSeed<'_, '_> {
    type Value = Vec<bool>;

    fn deserialize<D>(self, deserializer: D) -> Result<Vec<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ListSeed<'_, '_> {
    type Value = Vec<bool>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an array of {} for {}", self.type_name, self.path)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Vec<bool>, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let ListSeed {
            slot,
            metadata,
            type_name,
            path,
        } = self;
        let existing = slot.len();
        let mut present = Vec::new();
        loop {
            let index = present.len();
            let value = if index < existing {
                slot.get_mut(index)
            } else {
                slot.push(type_name)
            };
            let value = value.ok_or_else(|| cannot_create::<A::Error>(type_name, &path))?;
            let seed = ValueSeed {
                value,
                metadata,
                in_list: true,
                path,
            };
            match seq.next_element_seed(seed)? {
                Some(entry) => present.push(entry),
                None => break,
            }
        }
        slot.truncate(existing.max(present.len()));
        Ok(present)
    }
}

/// The start of a resource object, up to and including `resourceType`.
enum ResourceHead {
    /// `resourceType` came first; the other entries are still unread.
    Streamed(String),
    /// Entries that preceded `resourceType`, re-encoded as one object.
    Buffered {
        resource_type: String,
        object: String,
    },
}

impl ResourceHead {
    fn resource_type(&self) -> &str {
        match self {
            ResourceHead::Streamed(resource_type) => resource_type,
            ResourceHead::Buffered { resource_type, .. } => resource_type,
        }
    }
}

fn read_head<'de, A>(map: &mut A, path: Option<&FieldPath<'_>>) -> Result<ResourceHead, A::Error>
where
    A: MapAccess<'de>,
{
    let mut object = String::from("{");
    let mut resource_type = None;
    while let Some(key) = map.next_key::<String>()? {
        if key == "resourceType" {
            if resource_type.is_some() {
                return Err(A::Error::custom(format_args!(
                    "duplicate field `resourceType`{}",
                    ForPath(path)
                )));
            }
            let declared: String = map.next_value()?;
            if object.len() == 1 {
                return Ok(ResourceHead::Streamed(declared));
            }
            resource_type = Some(declared);
            continue;
        }
        let raw: Box<RawValue> = map.next_value()?;
        if object.len() > 1 {
            object.push(',');
        }
        let key = serde_json::to_string(&key).map_err(A::Error::custom)?;
        object.push_str(&key);
        object.push(':');
        object.push_str(raw.get());
    }
    object.push('}');
    match resource_type {
        Some(resource_type) => {
            tracing::trace!(resource_type = %resource_type, "resourceType is not the first property");
            Ok(ResourceHead::Buffered {
                resource_type,
                object,
            })
        }
        None => Err(A::Error::custom(format_args!(
            "resource is missing `resourceType`{}",
            ForPath(path)
        ))),
    }
}

fn read_body<'de, A>(
    head: ResourceHead,
    value: ValueMut<'_>,
    map: &mut A,
    path: Option<FieldPath<'_>>,
) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
{
    let type_name = value.type_name();
    let ValueMut::Element(element) = value else {
        return Err(A::Error::custom(format_args!(
            "{} is not a resource type{}",
            type_name,
            ForPath(path.as_ref())
        )));
    };
    match head {
        ResourceHead::Streamed(_) => read_fields(element, map, true),
        ResourceHead::Buffered { object, .. } => {
            let mut deserializer = serde_json::Deserializer::from_str(&object);
            ElementSeed {
                target: element,
                path,
            }
            .deserialize(&mut deserializer)
            .and_then(|()| deserializer.end())
            .map_err(relocate)
        }
    }
}

struct ResourceVisitor<T>(PhantomData<T>);

impl<'de, T: FhirValue> Visitor<'de> for ResourceVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a resource object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<T, A::Error>
    where
        A: MapAccess<'de>,
    {
        let head = read_head(&mut map, None)?;
        let mut value = T::instantiate(head.resource_type())
            .ok_or_else(|| unknown_resource::<A::Error>(head.resource_type(), None))?;
        read_body(head, value.as_value_mut(), &mut map, None)?;
        Ok(value)
    }
}

/// Where a resource read from a field ends up.
enum ResourceSlot<'a> {
    Optional(&'a mut dyn OptionalSlot),
    Required(&'a mut dyn RequiredSlot),
    Repeated(&'a mut dyn RepeatedSlot),
}

impl<'a> ResourceSlot<'a> {
    fn create(self, resource_type: &str) -> Option<ValueMut<'a>> {
        match self {
            ResourceSlot::Optional(slot) => slot.reset(resource_type),
            ResourceSlot::Required(slot) => slot.reset(resource_type),
            ResourceSlot::Repeated(slot) => slot.push(resource_type),
        }
    }
}

/// A resource-typed field value, read in place so that positions stay
/// relative to the whole document.
struct ResourceSeed<'a, 'k> {
    slot: ResourceSlot<'a>,
    path: FieldPath<'k>,
}

impl<'de> DeserializeSeed<'de> for ResourceSeed<'_, '_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for ResourceSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a resource object for {}", self.path)
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let ResourceSeed { slot, path } = self;
        let head = read_head(&mut map, Some(&path))?;
        let value = slot
            .create(head.resource_type())
            .ok_or_else(|| unknown_resource::<A::Error>(head.resource_type(), Some(&path)))?;
        read_body(head, value, &mut map, Some(path))
    }
}

/// `contained`: each entry picks its own type from `resourceType`.
struct ResourceListSeed<'a, 'k> {
    slot: &'a mut dyn RepeatedSlot,
    path: FieldPath<'k>,
}

impl<'de> DeserializeSeed<'de> for ResourceListSeed<'_, '_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ResourceListSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an array of resources for {}", self.path)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let ResourceListSeed { slot, path } = self;
        loop {
            let seed = ResourceSeed {
                slot: ResourceSlot::Repeated(&mut *slot),
                path,
            };
            if seq.next_element_seed(seed)?.is_none() {
                return Ok(());
            }
        }
    }
}
