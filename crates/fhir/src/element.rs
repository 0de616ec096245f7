//! The uniform element model.
//!
//! Concrete model types are ordinary structs and enums. The traits here let
//! generic code (codecs, traversal, validation) read and fill them through
//! their [`TypeDescriptor`] without knowing the concrete type:
//!
//! - [`FhirValue`]: anything that can sit in a field (primitive, element,
//!   choice, resource union)
//! - [`Element`]: a composite with index-addressed fields
//! - [`ValueRef`] / [`ValueMut`]: a borrowed view of one value
//! - [`FieldRef`] / [`FieldMut`]: a borrowed view of one field, by cardinality

use std::fmt;

use crate::descriptor::{TypeDescriptor, ValueKind};
use crate::primitives::PrimitiveElement;

/// A model type with a single FHIR type name.
pub trait FhirType {
    const TYPE_NAME: &'static str;
}

/// A value that can occupy a field.
pub trait FhirValue: fmt::Debug + Send + Sync + 'static {
    const KIND: ValueKind;
    /// Type names this value can hold; one entry unless it is a choice.
    const TYPE_NAMES: &'static [&'static str];

    /// Creates an empty value of the named concrete type, or `None` if this
    /// value cannot hold that type.
    fn instantiate(type_name: &str) -> Option<Self>
    where
        Self: Sized;

    fn as_value(&self) -> ValueRef<'_>;

    fn as_value_mut(&mut self) -> ValueMut<'_>;
}

/// Access to a type's descriptor without an instance.
pub trait StaticDescriptor {
    fn static_descriptor() -> &'static TypeDescriptor;
}

/// A composite element: fields addressed by their index in the descriptor.
pub trait Element: fmt::Debug + Send + Sync {
    fn descriptor(&self) -> &'static TypeDescriptor;

    fn field(&self, index: usize) -> FieldRef<'_>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// Borrowed view of a single value in the tree.
#[derive(Clone, Copy)]
pub enum ValueRef<'a> {
    Primitive(&'a dyn PrimitiveElement),
    Element(&'a dyn Element),
    /// An attribute string such as `Element.id` or `Extension.url`.
    System(&'a str),
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Primitive(p) => fmt::Debug::fmt(p, f),
            ValueRef::Element(e) => fmt::Debug::fmt(e, f),
            ValueRef::System(s) => fmt::Debug::fmt(s, f),
        }
    }
}

impl ValueRef<'_> {
    /// The concrete FHIR type name; attribute strings report `string`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueRef::Primitive(p) => p.type_name(),
            ValueRef::Element(e) => e.descriptor().name,
            ValueRef::System(_) => "string",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRef::Primitive(_) => ValueKind::Primitive,
            ValueRef::Element(e) => e.descriptor().kind,
            ValueRef::System(_) => ValueKind::System,
        }
    }

    /// A primitive with neither value nor metadata, or an element whose
    /// fields are all empty. Resources are never empty.
    ///
    /// Walks the subtree; code that visits every node uses [`Emptiness`].
    pub fn is_empty(&self) -> bool {
        match self {
            ValueRef::Primitive(p) => p.is_empty(),
            ValueRef::System(s) => s.is_empty(),
            ValueRef::Element(e) => {
                let descriptor = e.descriptor();
                if descriptor.kind == ValueKind::Resource {
                    return false;
                }
                (0..descriptor.fields.len())
                    .all(|index| e.field(index).values().iter().all(ValueRef::is_empty))
            }
        }
    }
}

/// [`ValueRef::is_empty`] for every value under a root, from one bottom-up
/// pass.
///
/// The entries of [`Emptiness::field`] line up with
/// `element.field(index).values()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emptiness {
    empty: bool,
    fields: Vec<Vec<Emptiness>>,
}

impl Emptiness {
    pub fn of(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Primitive(p) => Self::leaf(p.is_empty()),
            ValueRef::System(s) => Self::leaf(s.is_empty()),
            ValueRef::Element(e) => {
                let descriptor = e.descriptor();
                let fields: Vec<Vec<Emptiness>> = (0..descriptor.fields.len())
                    .map(|index| {
                        e.field(index)
                            .values()
                            .into_iter()
                            .map(Emptiness::of)
                            .collect()
                    })
                    .collect();
                let empty = descriptor.kind != ValueKind::Resource
                    && fields.iter().flatten().all(Emptiness::is_empty);
                Self { empty, fields }
            }
        }
    }

    fn leaf(empty: bool) -> Self {
        Self {
            empty,
            fields: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// One entry per value of field `index`; nothing for primitives.
    pub fn field(&self, index: usize) -> &[Emptiness] {
        self.fields.get(index).map(Vec::as_slice).unwrap_or_default()
    }
}

pub enum ValueMut<'a> {
    Primitive(&'a mut dyn PrimitiveElement),
    Element(&'a mut dyn Element),
}

impl ValueMut<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueMut::Primitive(p) => p.type_name(),
            ValueMut::Element(e) => e.descriptor().name,
        }
    }
}

/// Borrowed view of a field's current contents.
#[derive(Debug)]
pub enum FieldRef<'a> {
    Single(Option<ValueRef<'a>>),
    Many(Vec<ValueRef<'a>>),
    Attribute(Option<&'a str>),
}

impl<'a> FieldRef<'a> {
    /// Every populated value of the field, in order.
    pub fn values(self) -> Vec<ValueRef<'a>> {
        match self {
            FieldRef::Single(value) => value.into_iter().collect(),
            FieldRef::Many(values) => values,
            FieldRef::Attribute(value) => value.map(ValueRef::System).into_iter().collect(),
        }
    }
}

/// Mutable access to a field, by cardinality.
pub enum FieldMut<'a> {
    Optional(&'a mut dyn OptionalSlot),
    Required(&'a mut dyn RequiredSlot),
    Repeated(&'a mut dyn RepeatedSlot),
    Attribute(&'a mut dyn AttributeSlot),
}

/// An `Option<T>` field.
pub trait OptionalSlot {
    fn value_mut(&mut self) -> Option<ValueMut<'_>>;

    /// Replaces the contents with an empty value of `type_name`.
    fn reset(&mut self, type_name: &str) -> Option<ValueMut<'_>>;

    fn clear(&mut self);
}

impl<T: FhirValue> OptionalSlot for Option<T> {
    fn value_mut(&mut self) -> Option<ValueMut<'_>> {
        self.as_mut().map(FhirValue::as_value_mut)
    }

    fn reset(&mut self, type_name: &str) -> Option<ValueMut<'_>> {
        let fresh = T::instantiate(type_name)?;
        Some(self.insert(fresh).as_value_mut())
    }

    fn clear(&mut self) {
        *self = None;
    }
}

/// A bare `T` field.
pub trait RequiredSlot {
    fn value_mut(&mut self) -> ValueMut<'_>;

    fn reset(&mut self, type_name: &str) -> Option<ValueMut<'_>>;
}

impl<T: FhirValue> RequiredSlot for T {
    fn value_mut(&mut self) -> ValueMut<'_> {
        self.as_value_mut()
    }

    fn reset(&mut self, type_name: &str) -> Option<ValueMut<'_>> {
        *self = T::instantiate(type_name)?;
        Some(self.as_value_mut())
    }
}

/// A `Vec<T>` field.
pub trait RepeatedSlot {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an empty value of `type_name` and returns it.
    fn push(&mut self, type_name: &str) -> Option<ValueMut<'_>>;

    fn get_mut(&mut self, index: usize) -> Option<ValueMut<'_>>;

    fn truncate(&mut self, len: usize);
}

impl<T: FhirValue> RepeatedSlot for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn push(&mut self, type_name: &str) -> Option<ValueMut<'_>> {
        let fresh = T::instantiate(type_name)?;
        Vec::push(self, fresh);
        self.last_mut().map(FhirValue::as_value_mut)
    }

    fn get_mut(&mut self, index: usize) -> Option<ValueMut<'_>> {
        <[T]>::get_mut(self, index).map(FhirValue::as_value_mut)
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len)
    }
}

/// A plain string field (`Element.id`, `Extension.url`).
pub trait AttributeSlot {
    fn get(&self) -> Option<&str>;

    fn set(&mut self, value: String);
}

impl AttributeSlot for Option<String> {
    fn get(&self) -> Option<&str> {
        self.as_deref()
    }

    fn set(&mut self, value: String) {
        *self = Some(value);
    }
}

impl AttributeSlot for String {
    fn get(&self) -> Option<&str> {
        Some(self.as_str()).filter(|s| !s.is_empty())
    }

    fn set(&mut self, value: String) {
        *self = value;
    }
}

impl<T: FhirType> FhirType for Box<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;
}

impl<T: FhirValue> FhirValue for Box<T> {
    const KIND: ValueKind = T::KIND;
    const TYPE_NAMES: &'static [&'static str] = T::TYPE_NAMES;

    fn instantiate(type_name: &str) -> Option<Self> {
        T::instantiate(type_name).map(Box::new)
    }

    fn as_value(&self) -> ValueRef<'_> {
        (**self).as_value()
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        (**self).as_value_mut()
    }
}
