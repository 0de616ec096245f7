//! General-purpose data types.
//!
//! Composite elements keep their element-level `id` as a plain string: it is
//! an XML attribute and a JSON property without a `_id` sibling.

use fhirkit_macro::{FhirChoice, FhirElement};

use crate::primitives::{
    Base64Binary, Boolean, Canonical, Code, Date, DateTime, Decimal, FhirString, Id, Instant,
    Integer, Markdown, PositiveInt, Time, UnsignedInt, Uri, Url, Xhtml,
};

/// Additional content defined outside the base definition.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Extension {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    #[fhir(attribute)]
    pub url: String,
    pub value: Option<ExtensionValue>,
}

impl Extension {
    pub fn new(url: impl Into<String>, value: ExtensionValue) -> Self {
        Self {
            url: url.into(),
            value: Some(value),
            ..Default::default()
        }
    }
}

/// `Extension.value[x]`.
#[derive(Debug, Clone, PartialEq, FhirChoice)]
pub enum ExtensionValue {
    Base64Binary(Base64Binary),
    Boolean(Boolean),
    Canonical(Canonical),
    Code(Code),
    Date(Date),
    DateTime(DateTime),
    Decimal(Decimal),
    Id(Id),
    Instant(Instant),
    Integer(Integer),
    Markdown(Markdown),
    PositiveInt(PositiveInt),
    String(FhirString),
    Time(Time),
    UnsignedInt(UnsignedInt),
    Uri(Uri),
    Url(Url),
    Attachment(Box<Attachment>),
    CodeableConcept(Box<CodeableConcept>),
    Coding(Box<Coding>),
    Identifier(Box<Identifier>),
    Period(Box<Period>),
    Quantity(Box<Quantity>),
    Ratio(Box<Ratio>),
    Reference(Box<Reference>),
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Coding {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub system: Option<Uri>,
    pub version: Option<FhirString>,
    pub code: Option<Code>,
    pub display: Option<FhirString>,
    pub user_selected: Option<Boolean>,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct CodeableConcept {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub coding: Vec<Coding>,
    pub text: Option<FhirString>,
}

impl CodeableConcept {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A measured amount.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Quantity {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub value: Option<Decimal>,
    pub comparator: Option<Code>,
    pub unit: Option<FhirString>,
    pub system: Option<Uri>,
    pub code: Option<Code>,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Ratio {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub numerator: Option<Quantity>,
    pub denominator: Option<Quantity>,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Period {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub start: Option<DateTime>,
    pub end: Option<DateTime>,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Identifier {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub use_: Option<Code>,
    pub type_: Option<CodeableConcept>,
    pub system: Option<Uri>,
    pub value: Option<FhirString>,
    pub period: Option<Period>,
    pub assigner: Option<Box<Reference>>,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Reference {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub reference: Option<FhirString>,
    pub type_: Option<Uri>,
    pub identifier: Option<Box<Identifier>>,
    pub display: Option<FhirString>,
}

impl Reference {
    pub fn to(reference: &str) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }
}

/// Resource metadata.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Meta {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub version_id: Option<Id>,
    pub last_updated: Option<Instant>,
    pub source: Option<Uri>,
    pub profile: Vec<Canonical>,
    pub security: Vec<Coding>,
    pub tag: Vec<Coding>,
}

/// Human-readable summary of a resource.
#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Narrative {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub status: Code,
    pub div: Xhtml,
}

#[derive(Debug, Clone, PartialEq, Default, FhirElement)]
pub struct Attachment {
    #[fhir(attribute)]
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub content_type: Option<Code>,
    pub language: Option<Code>,
    pub data: Option<Base64Binary>,
    pub url: Option<Url>,
    pub size: Option<UnsignedInt>,
    pub hash: Option<Base64Binary>,
    pub title: Option<FhirString>,
    pub creation: Option<DateTime>,
}

