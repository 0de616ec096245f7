//! Primitive value envelopes.
//!
//! A FHIR primitive is a value plus optional metadata: an element `id` and a
//! list of extensions. [`Primitive<V>`] holds all three, each independently
//! optional, so a metadata-only primitive (`{"_birthDate": {"id": "b1"}}`)
//! stays distinguishable from an absent one.
//!
//! The lexical value types (`CodeValue`, `DateValue`, ...) validate their
//! text on construction; decoding an invalid lexical form is a structural
//! error naming the FHIR type.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use fhirkit_fhirpath_support::{EvaluationResult, TypeInfoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::datatypes::Extension;
use crate::descriptor::ValueKind;
use crate::element::{FhirType, FhirValue, ValueMut, ValueRef};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("invalid {type_name} value `{value}`")]
    InvalidLexical {
        type_name: &'static str,
        value: String,
    },

    #[error("a {type_name} value cannot be read from a JSON {found}")]
    WrongJsonType {
        type_name: &'static str,
        found: &'static str,
    },
}

impl PrimitiveError {
    fn invalid(type_name: &'static str, value: &str) -> Self {
        PrimitiveError::InvalidLexical {
            type_name,
            value: value.to_string(),
        }
    }
}

/// A primitive value as the traversal protocol sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Boolean(bool),
    Integer(i64),
    Decimal(&'a PreciseDecimal),
    Text(&'a str),
}

impl<'a> Scalar<'a> {
    /// The lexical form used on the wire (`value="..."` in XML).
    pub fn to_text(&self) -> Cow<'a, str> {
        match *self {
            Scalar::Boolean(true) => Cow::Borrowed("true"),
            Scalar::Boolean(false) => Cow::Borrowed("false"),
            Scalar::Integer(i) => Cow::Owned(i.to_string()),
            Scalar::Decimal(d) => Cow::Borrowed(d.original_string()),
            Scalar::Text(s) => Cow::Borrowed(s),
        }
    }
}

/// A JSON scalar token handed to a primitive for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonScalar<'a> {
    Bool(bool),
    /// Number text exactly as it appeared in the source.
    Number(&'a str),
    String(&'a str),
}

impl JsonScalar<'_> {
    fn kind(&self) -> &'static str {
        match self {
            JsonScalar::Bool(_) => "boolean",
            JsonScalar::Number(_) => "number",
            JsonScalar::String(_) => "string",
        }
    }
}

/// The value half of a primitive.
pub trait PrimitiveValue: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    const TYPE_NAME: &'static str;

    fn scalar(&self) -> Scalar<'_>;

    fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError>;

    /// Parses the lexical form (the XML `value` attribute).
    fn from_text(text: &str) -> Result<Self, PrimitiveError>;

    fn to_evaluation_result(&self) -> EvaluationResult;
}

fn wrong_json(type_name: &'static str, token: JsonScalar<'_>) -> PrimitiveError {
    PrimitiveError::WrongJsonType {
        type_name,
        found: token.kind(),
    }
}

fn type_info(type_name: &str) -> Option<TypeInfoResult> {
    Some(TypeInfoResult::fhir(type_name))
}

impl PrimitiveValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn scalar(&self) -> Scalar<'_> {
        Scalar::Boolean(*self)
    }

    fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
        match token {
            JsonScalar::Bool(b) => Ok(b),
            other => Err(wrong_json(Self::TYPE_NAME, other)),
        }
    }

    fn from_text(text: &str) -> Result<Self, PrimitiveError> {
        match text {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(PrimitiveError::invalid(Self::TYPE_NAME, other)),
        }
    }

    fn to_evaluation_result(&self) -> EvaluationResult {
        EvaluationResult::Boolean(*self, type_info(Self::TYPE_NAME))
    }
}

impl PrimitiveValue for i32 {
    const TYPE_NAME: &'static str = "integer";

    fn scalar(&self) -> Scalar<'_> {
        Scalar::Integer(i64::from(*self))
    }

    fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
        match token {
            JsonScalar::Number(n) => Self::from_text(n),
            other => Err(wrong_json(Self::TYPE_NAME, other)),
        }
    }

    fn from_text(text: &str) -> Result<Self, PrimitiveError> {
        text.parse()
            .map_err(|_| PrimitiveError::invalid(Self::TYPE_NAME, text))
    }

    fn to_evaluation_result(&self) -> EvaluationResult {
        EvaluationResult::Integer(i64::from(*self), type_info(Self::TYPE_NAME))
    }
}

macro_rules! unsigned_primitive {
    ($(#[$doc:meta])* $name:ident, $type_name:literal, $valid:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(value: u32) -> Result<Self, PrimitiveError> {
                if !($valid)(value) {
                    return Err(PrimitiveError::invalid($type_name, &value.to_string()));
                }
                Ok(Self(value))
            }

            pub fn get(&self) -> u32 {
                self.0
            }
        }

        impl PrimitiveValue for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn scalar(&self) -> Scalar<'_> {
                Scalar::Integer(i64::from(self.0))
            }

            fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
                match token {
                    JsonScalar::Number(n) => Self::from_text(n),
                    other => Err(wrong_json(Self::TYPE_NAME, other)),
                }
            }

            fn from_text(text: &str) -> Result<Self, PrimitiveError> {
                let value: u32 = text
                    .parse()
                    .map_err(|_| PrimitiveError::invalid(Self::TYPE_NAME, text))?;
                Self::new(value)
            }

            fn to_evaluation_result(&self) -> EvaluationResult {
                EvaluationResult::Integer(i64::from(self.0), type_info(Self::TYPE_NAME))
            }
        }
    };
}

unsigned_primitive!(
    /// An integer greater than zero.
    PositiveIntValue,
    "positiveInt",
    |v: u32| v > 0
);
unsigned_primitive!(
    /// A non-negative integer.
    UnsignedIntValue,
    "unsignedInt",
    |_: u32| true
);

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").expect("static pattern")
});

/// A decimal together with the text it was read from.
///
/// FHIR decimals are exact to their written form, so `1.50` and `1.5e2` are
/// written back the way they came in. Equality compares numeric values.
#[derive(Debug, Clone)]
pub struct PreciseDecimal {
    value: rust_decimal::Decimal,
    original: String,
}

impl PreciseDecimal {
    /// Pairs a value with its lexical form; the two are not cross-checked.
    pub fn from_parts(value: rust_decimal::Decimal, original: impl Into<String>) -> Self {
        Self {
            value,
            original: original.into(),
        }
    }

    pub fn value(&self) -> rust_decimal::Decimal {
        self.value
    }

    pub fn original_string(&self) -> &str {
        &self.original
    }
}

impl From<rust_decimal::Decimal> for PreciseDecimal {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self {
            value,
            original: value.to_string(),
        }
    }
}

impl PartialEq for PreciseDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for PreciseDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for PreciseDecimal {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)
    }
}

fn parse_decimal(text: &str) -> Result<PreciseDecimal, PrimitiveError> {
    let invalid = || PrimitiveError::invalid("decimal", text);
    if !DECIMAL.is_match(text) {
        return Err(invalid());
    }
    let value = if text.contains(['e', 'E']) {
        rust_decimal::Decimal::from_scientific(text).map_err(|_| invalid())?
    } else {
        rust_decimal::Decimal::from_str(text).map_err(|_| invalid())?
    };
    Ok(PreciseDecimal::from_parts(value, text))
}

impl PrimitiveValue for PreciseDecimal {
    const TYPE_NAME: &'static str = "decimal";

    fn scalar(&self) -> Scalar<'_> {
        Scalar::Decimal(self)
    }

    fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
        match token {
            JsonScalar::Number(n) => parse_decimal(n),
            other => Err(wrong_json(Self::TYPE_NAME, other)),
        }
    }

    fn from_text(text: &str) -> Result<Self, PrimitiveError> {
        parse_decimal(text)
    }

    fn to_evaluation_result(&self) -> EvaluationResult {
        EvaluationResult::Decimal(self.value, type_info(Self::TYPE_NAME))
    }
}

impl PrimitiveValue for String {
    const TYPE_NAME: &'static str = "string";

    fn scalar(&self) -> Scalar<'_> {
        Scalar::Text(self)
    }

    fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
        match token {
            JsonScalar::String(s) => Ok(s.to_string()),
            other => Err(wrong_json(Self::TYPE_NAME, other)),
        }
    }

    fn from_text(text: &str) -> Result<Self, PrimitiveError> {
        Ok(text.to_string())
    }

    fn to_evaluation_result(&self) -> EvaluationResult {
        EvaluationResult::String(self.clone(), type_info(Self::TYPE_NAME))
    }
}

static CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s]+( [^\s]+)*$").expect("static pattern"));
static ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("static pattern"));
static URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S*$").expect("static pattern"));
static BASE64: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*([0-9a-zA-Z\+/=]){4}\s*)*$").expect("static pattern"));
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1]))?)?$")
        .expect("static pattern")
});
static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1])(T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00)))?)?)?$")
        .expect("static pattern")
});
static INSTANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))$")
        .expect("static pattern")
});
static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?$").expect("static pattern")
});

fn any_text(_: &str) -> bool {
    true
}

fn is_code(text: &str) -> bool {
    CODE.is_match(text)
}

fn is_id(text: &str) -> bool {
    ID.is_match(text)
}

fn is_uri(text: &str) -> bool {
    URI.is_match(text)
}

fn is_base64(text: &str) -> bool {
    BASE64.is_match(text)
}

/// Regex shape plus calendar validity of the day, when a full date is present.
fn has_valid_calendar_date(text: &str) -> bool {
    match text.get(..10) {
        Some(day) if day.len() == 10 => NaiveDate::parse_from_str(day, "%Y-%m-%d").is_ok(),
        _ => true,
    }
}

pub(crate) fn is_date(text: &str) -> bool {
    DATE.is_match(text) && has_valid_calendar_date(text)
}

pub(crate) fn is_date_time(text: &str) -> bool {
    DATE_TIME.is_match(text) && has_valid_calendar_date(text)
}

fn is_instant(text: &str) -> bool {
    INSTANT.is_match(text) && has_valid_calendar_date(text)
}

pub(crate) fn is_time(text: &str) -> bool {
    TIME.is_match(text)
}

macro_rules! text_primitive {
    ($(#[$doc:meta])* $name:ident, $type_name:literal, $check:path, $eval:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, PrimitiveError> {
                let value = value.into();
                if !$check(&value) {
                    return Err(PrimitiveError::InvalidLexical {
                        type_name: $type_name,
                        value,
                    });
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl PrimitiveValue for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn scalar(&self) -> Scalar<'_> {
                Scalar::Text(&self.0)
            }

            fn from_json(token: JsonScalar<'_>) -> Result<Self, PrimitiveError> {
                match token {
                    JsonScalar::String(s) => Self::new(s),
                    other => Err(wrong_json(Self::TYPE_NAME, other)),
                }
            }

            fn from_text(text: &str) -> Result<Self, PrimitiveError> {
                Self::new(text)
            }

            fn to_evaluation_result(&self) -> EvaluationResult {
                EvaluationResult::$eval(self.0.clone(), type_info(Self::TYPE_NAME))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

text_primitive!(CodeValue, "code", is_code, String);
text_primitive!(
    /// At most 64 characters from `[A-Za-z0-9\-\.]`.
    IdValue,
    "id",
    is_id,
    String
);
text_primitive!(UriValue, "uri", is_uri, String);
text_primitive!(UrlValue, "url", is_uri, String);
text_primitive!(CanonicalValue, "canonical", is_uri, String);
text_primitive!(MarkdownValue, "markdown", any_text, String);
text_primitive!(Base64BinaryValue, "base64Binary", is_base64, String);
text_primitive!(
    /// Raw XHTML of a narrative `div`, including the element itself.
    XhtmlValue,
    "xhtml",
    any_text,
    String
);
text_primitive!(
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    DateValue,
    "date",
    is_date,
    Date
);
text_primitive!(DateTimeValue, "dateTime", is_date_time, DateTime);
text_primitive!(InstantValue, "instant", is_instant, DateTime);
text_primitive!(TimeValue, "time", is_time, Time);

/// A primitive value with its optional `id` and extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive<V> {
    pub id: Option<String>,
    pub extension: Vec<Extension>,
    pub value: Option<V>,
}

impl<V> Default for Primitive<V> {
    fn default() -> Self {
        Self {
            id: None,
            extension: Vec::new(),
            value: None,
        }
    }
}

impl<V> Primitive<V> {
    pub fn new(value: V) -> Self {
        Self {
            id: None,
            extension: Vec::new(),
            value: Some(value),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension.push(extension);
        self
    }
}

impl<V: PrimitiveValue> Primitive<V> {
    /// Builds a primitive from its lexical form.
    pub fn parse(text: &str) -> Result<Self, PrimitiveError> {
        V::from_text(text).map(Self::new)
    }
}

impl<V: PrimitiveValue> From<V> for Primitive<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

impl From<rust_decimal::Decimal> for Primitive<PreciseDecimal> {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self::new(value.into())
    }
}

impl From<&str> for Primitive<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// Object-safe view of any [`Primitive<V>`].
pub trait PrimitiveElement: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn id(&self) -> Option<&str>;

    fn extension(&self) -> &[Extension];

    fn scalar(&self) -> Option<Scalar<'_>>;

    fn set_id(&mut self, id: Option<String>);

    fn extension_mut(&mut self) -> &mut Vec<Extension>;

    fn set_json(&mut self, token: JsonScalar<'_>) -> Result<(), PrimitiveError>;

    fn set_text(&mut self, text: &str) -> Result<(), PrimitiveError>;

    fn to_evaluation_result(&self) -> Option<EvaluationResult>;

    fn has_metadata(&self) -> bool {
        self.id().is_some() || !self.extension().is_empty()
    }

    fn is_empty(&self) -> bool {
        self.scalar().is_none() && !self.has_metadata()
    }
}

impl<V: PrimitiveValue> PrimitiveElement for Primitive<V> {
    fn type_name(&self) -> &'static str {
        V::TYPE_NAME
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn extension(&self) -> &[Extension] {
        &self.extension
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        self.value.as_ref().map(PrimitiveValue::scalar)
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn extension_mut(&mut self) -> &mut Vec<Extension> {
        &mut self.extension
    }

    fn set_json(&mut self, token: JsonScalar<'_>) -> Result<(), PrimitiveError> {
        self.value = Some(V::from_json(token)?);
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<(), PrimitiveError> {
        self.value = Some(V::from_text(text)?);
        Ok(())
    }

    fn to_evaluation_result(&self) -> Option<EvaluationResult> {
        self.value.as_ref().map(PrimitiveValue::to_evaluation_result)
    }
}

impl<V: PrimitiveValue> FhirType for Primitive<V> {
    const TYPE_NAME: &'static str = V::TYPE_NAME;
}

impl<V: PrimitiveValue> FhirValue for Primitive<V> {
    const KIND: ValueKind = ValueKind::Primitive;
    const TYPE_NAMES: &'static [&'static str] = &[V::TYPE_NAME];

    fn instantiate(type_name: &str) -> Option<Self> {
        (type_name == V::TYPE_NAME).then(Self::default)
    }

    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Primitive(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Primitive(self)
    }
}

pub type Boolean = Primitive<bool>;
pub type Integer = Primitive<i32>;
pub type PositiveInt = Primitive<PositiveIntValue>;
pub type UnsignedInt = Primitive<UnsignedIntValue>;
pub type Decimal = Primitive<PreciseDecimal>;
pub type FhirString = Primitive<String>;
pub type Code = Primitive<CodeValue>;
pub type Id = Primitive<IdValue>;
pub type Uri = Primitive<UriValue>;
pub type Url = Primitive<UrlValue>;
pub type Canonical = Primitive<CanonicalValue>;
pub type Markdown = Primitive<MarkdownValue>;
pub type Base64Binary = Primitive<Base64BinaryValue>;
pub type Xhtml = Primitive<XhtmlValue>;
pub type Date = Primitive<DateValue>;
pub type DateTime = Primitive<DateTimeValue>;
pub type Instant = Primitive<InstantValue>;
pub type Time = Primitive<TimeValue>;

/// Every primitive type name the model knows.
pub const PRIMITIVE_TYPE_NAMES: &[&str] = &[
    "base64Binary",
    "boolean",
    "canonical",
    "code",
    "date",
    "dateTime",
    "decimal",
    "id",
    "instant",
    "integer",
    "markdown",
    "positiveInt",
    "string",
    "time",
    "unsignedInt",
    "uri",
    "url",
    "xhtml",
];

/// The FHIRPath system type a primitive's value maps to.
pub fn system_type_name(type_name: &str) -> &'static str {
    match type_name {
        "boolean" => "Boolean",
        "integer" | "positiveInt" | "unsignedInt" => "Integer",
        "decimal" => "Decimal",
        "date" => "Date",
        "dateTime" | "instant" => "DateTime",
        "time" => "Time",
        _ => "String",
    }
}
