//! Entity roots.
//!
//! Each resource carries the `DomainResource` field set (logical id, meta,
//! narrative, contained resources, extensions) followed by its own fields.
//! [`Resource`] is the type-name-keyed union used wherever a field holds "any
//! resource", e.g. `contained`.

use fhirkit_macro::{FhirChoice, FhirElement};

use crate::datatypes::{
    Attachment, CodeableConcept, Extension, Identifier, Meta, Narrative, Quantity, Reference,
};
use crate::primitives::{Boolean, Code, Date, FhirString, Id, Markdown, Uri};

/// A resource held by type name.
#[derive(Debug, Clone, PartialEq, FhirChoice)]
#[fhir(resource_union)]
pub enum Resource {
    Basic(Box<Basic>),
    SubstanceDefinition(Box<SubstanceDefinition>),
}

/// A resource for content that has no dedicated resource type.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
#[fhir(resource)]
pub struct Basic {
    pub id: Option<Id>,
    pub meta: Option<Meta>,
    pub implicit_rules: Option<Uri>,
    pub language: Option<Code>,
    pub text: Option<Narrative>,
    pub contained: Vec<Resource>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
    pub identifier: Vec<Identifier>,
    pub code: CodeableConcept,
    pub subject: Option<Reference>,
    pub created: Option<Date>,
    pub author: Option<Reference>,
}

/// The detailed description of a substance.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
#[fhir(resource)]
pub struct SubstanceDefinition {
    pub id: Option<Id>,
    pub meta: Option<Meta>,
    pub implicit_rules: Option<Uri>,
    pub language: Option<Code>,
    pub text: Option<Narrative>,
    pub contained: Vec<Resource>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
    pub identifier: Vec<Identifier>,
    pub version: Option<FhirString>,
    pub status: Option<CodeableConcept>,
    pub classification: Vec<CodeableConcept>,
    pub domain: Option<CodeableConcept>,
    pub grade: Vec<CodeableConcept>,
    pub description: Option<Markdown>,
    pub manufacturer: Vec<Reference>,
    pub supplier: Vec<Reference>,
    pub moiety: Vec<SubstanceDefinitionMoiety>,
    pub property: Vec<SubstanceDefinitionProperty>,
    pub name: Vec<SubstanceDefinitionName>,
}

/// Moiety: a structural part of the substance.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
#[fhir(name = "SubstanceDefinition.moiety", base = "BackboneElement")]
pub struct SubstanceDefinitionMoiety {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
    pub role: Option<CodeableConcept>,
    pub identifier: Option<Identifier>,
    pub name: Option<FhirString>,
    pub stereochemistry: Option<CodeableConcept>,
    pub optical_activity: Option<CodeableConcept>,
    pub molecular_formula: Option<FhirString>,
    pub amount: Option<SubstanceDefinitionMoietyAmount>,
    pub measurement_type: Option<CodeableConcept>,
}

/// `SubstanceDefinition.moiety.amount[x]`.
#[derive(Debug, Clone, PartialEq, FhirChoice)]
pub enum SubstanceDefinitionMoietyAmount {
    Quantity(Box<Quantity>),
    String(FhirString),
}

/// A general property of the substance.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
#[fhir(name = "SubstanceDefinition.property", base = "BackboneElement")]
pub struct SubstanceDefinitionProperty {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
    pub type_: CodeableConcept,
    pub value: Option<SubstanceDefinitionPropertyValue>,
}

/// `SubstanceDefinition.property.value[x]`.
#[derive(Debug, Clone, PartialEq, FhirChoice)]
pub enum SubstanceDefinitionPropertyValue {
    CodeableConcept(Box<CodeableConcept>),
    Quantity(Box<Quantity>),
    Date(Date),
    Boolean(Boolean),
    Attachment(Box<Attachment>),
}

/// Names applied to the substance, with synonyms nested beneath them.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
#[fhir(name = "SubstanceDefinition.name", base = "BackboneElement")]
pub struct SubstanceDefinitionName {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub modifier_extension: Vec<Extension>,
    pub name: FhirString,
    pub type_: Option<CodeableConcept>,
    pub status: Option<CodeableConcept>,
    pub preferred: Option<Boolean>,
    pub language: Vec<CodeableConcept>,
    pub domain: Vec<CodeableConcept>,
    pub jurisdiction: Vec<CodeableConcept>,
    pub synonym: Vec<SubstanceDefinitionName>,
    pub translation: Vec<SubstanceDefinitionName>,
}
