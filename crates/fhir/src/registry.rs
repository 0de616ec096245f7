//! Global lookup of static type information by FHIR type name.

use std::collections::BTreeMap;

use fhirkit_fhirpath_support::ClassInfo;
use once_cell::sync::Lazy;

use crate::datatypes::{
    Attachment, CodeableConcept, Coding, Extension, Identifier, Meta, Narrative, Period, Quantity,
    Ratio, Reference,
};
use crate::descriptor::TypeDescriptor;
use crate::element::StaticDescriptor;
use crate::primitives::PRIMITIVE_TYPE_NAMES;
use crate::resources::{
    Basic, SubstanceDefinition, SubstanceDefinitionMoiety, SubstanceDefinitionName,
    SubstanceDefinitionProperty,
};
use crate::traversal::primitive_class_info;

static DESCRIPTORS: Lazy<BTreeMap<&'static str, &'static TypeDescriptor>> = Lazy::new(|| {
    let all = [
        Extension::static_descriptor(),
        Coding::static_descriptor(),
        CodeableConcept::static_descriptor(),
        Quantity::static_descriptor(),
        Ratio::static_descriptor(),
        Period::static_descriptor(),
        Identifier::static_descriptor(),
        Reference::static_descriptor(),
        Meta::static_descriptor(),
        Narrative::static_descriptor(),
        Attachment::static_descriptor(),
        Basic::static_descriptor(),
        SubstanceDefinition::static_descriptor(),
        SubstanceDefinitionMoiety::static_descriptor(),
        SubstanceDefinitionProperty::static_descriptor(),
        SubstanceDefinitionName::static_descriptor(),
    ];
    all.into_iter().map(|d| (d.name, d)).collect()
});

/// The descriptor of a complex type or resource.
pub fn descriptor(type_name: &str) -> Option<&'static TypeDescriptor> {
    DESCRIPTORS.get(type_name).copied()
}

/// Class info for any known type, primitives included.
pub fn class_info(type_name: &str) -> Option<ClassInfo> {
    if PRIMITIVE_TYPE_NAMES.contains(&type_name) {
        return Some(primitive_class_info(type_name));
    }
    descriptor(type_name).map(TypeDescriptor::class_info)
}

/// Every registered type name: primitives first, then complex types and
/// resources in name order.
pub fn type_names() -> impl Iterator<Item = &'static str> {
    PRIMITIVE_TYPE_NAMES
        .iter()
        .copied()
        .chain(DESCRIPTORS.keys().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backbone_is_registered_by_path_name() {
        let info = class_info("SubstanceDefinition.property").unwrap();
        assert_eq!(info.base_type.as_deref(), Some("FHIR.BackboneElement"));
        let value = info.element("value").unwrap();
        assert_eq!(
            value.type_names,
            vec![
                "FHIR.CodeableConcept",
                "FHIR.Quantity",
                "FHIR.date",
                "FHIR.boolean",
                "FHIR.Attachment"
            ]
        );
    }

    #[test]
    fn test_resource_class_info() {
        let info = class_info("SubstanceDefinition").unwrap();
        assert_eq!(info.base_type.as_deref(), Some("FHIR.DomainResource"));
        let contained = info.element("contained").unwrap();
        assert!(contained.is_list);
        assert_eq!(contained.type_names, vec!["FHIR.Resource"]);
    }

    #[test]
    fn test_unknown_type() {
        assert!(class_info("Patient").is_none());
        assert!(type_names().any(|name| name == "dateTime"));
        assert!(type_names().any(|name| name == "Basic"));
    }
}
