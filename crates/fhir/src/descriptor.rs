//! Static type descriptors.
//!
//! Every model type owns one `'static` [`TypeDescriptor`], emitted by
//! `#[derive(FhirElement)]`. The descriptor lists the type's fields in
//! declaration order; both codecs and the traversal protocol are driven by it
//! instead of by per-type code.

use std::borrow::Cow;
use std::collections::HashMap;

use fhirkit_fhirpath_support::{ClassInfo, ClassInfoElement};
use once_cell::sync::OnceCell;

/// What kind of value a field (or a type) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A primitive envelope: value plus optional `id`/`extension`.
    Primitive,
    /// A composite element.
    Complex,
    /// An entity root, written with its `resourceType`.
    Resource,
    /// A polymorphic `name[x]` field.
    Choice,
    /// A plain string carried as an XML attribute (`Element.id`, `Extension.url`).
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug)]
pub struct FieldDescriptor {
    /// Logical field name, e.g. `value` for `value[x]`.
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub kind: ValueKind,
    /// Declared type names; every allowed type for a choice field.
    pub types: &'static [&'static str],
}

impl FieldDescriptor {
    pub fn is_choice(&self) -> bool {
        self.kind == ValueKind::Choice
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == ValueKind::System
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn allows(&self, type_name: &str) -> bool {
        self.types.contains(&type_name)
    }

    /// Wire name of this field when it holds a value of `type_name`.
    pub fn wire_name(&self, type_name: &str) -> Cow<'static, str> {
        if self.is_choice() {
            Cow::Owned(choice_wire_name(self.name, type_name))
        } else {
            Cow::Borrowed(self.name)
        }
    }
}

/// Resolution of a wire name against a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField {
    /// Index into [`TypeDescriptor::fields`].
    pub index: usize,
    /// Concrete type selected by the wire name; `None` unless the field is a choice.
    pub choice_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub base: Option<&'static str>,
    pub kind: ValueKind,
    pub fields: &'static [FieldDescriptor],
    wire_names: OnceCell<HashMap<String, WireField>>,
}

impl TypeDescriptor {
    pub const fn new(
        name: &'static str,
        base: Option<&'static str>,
        kind: ValueKind,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self {
            name,
            base,
            kind,
            fields,
            wire_names: OnceCell::new(),
        }
    }

    /// Resolves a wire name (`valueQuantity`, `status`) to its field.
    ///
    /// The table is built on first use and shared for the life of the process.
    pub fn lookup(&self, wire_name: &str) -> Option<WireField> {
        self.wire_names
            .get_or_init(|| self.build_wire_names())
            .get(wire_name)
            .copied()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn build_wire_names(&self) -> HashMap<String, WireField> {
        let mut names = HashMap::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.is_choice() {
                for type_name in field.types {
                    names.insert(
                        choice_wire_name(field.name, type_name),
                        WireField {
                            index,
                            choice_type: Some(*type_name),
                        },
                    );
                }
            } else {
                names.insert(
                    field.name.to_string(),
                    WireField {
                        index,
                        choice_type: None,
                    },
                );
            }
        }
        tracing::trace!(type_name = self.name, entries = names.len(), "built wire name table");
        names
    }

    /// Static class info for this type, in FHIRPath terms.
    pub fn class_info(&self) -> ClassInfo {
        ClassInfo {
            namespace: "FHIR".to_string(),
            name: self.name.to_string(),
            base_type: self.base.map(|b| format!("FHIR.{}", b)),
            elements: self
                .fields
                .iter()
                .map(|field| ClassInfoElement {
                    name: field.name.to_string(),
                    type_names: field
                        .types
                        .iter()
                        .map(|t| qualified_type_name(field.kind, t))
                        .collect(),
                    is_list: field.is_repeated(),
                })
                .collect(),
        }
    }
}

/// `amount` + `Quantity` is `amountQuantity`; `value` + `dateTime` is `valueDateTime`.
pub fn choice_wire_name(field: &str, type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => {
            let mut name = String::with_capacity(field.len() + type_name.len());
            name.push_str(field);
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
            name
        }
        None => field.to_string(),
    }
}

fn qualified_type_name(kind: ValueKind, type_name: &str) -> String {
    match kind {
        ValueKind::System => "System.String".to_string(),
        _ => format!("FHIR.{}", type_name),
    }
}
