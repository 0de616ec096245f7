//! # fhirkit FHIRPath support
//!
//! The types in this crate are the vocabulary an expression evaluator uses when
//! it walks a `fhirkit` element tree. The model crate produces them, the
//! evaluator consumes them, and neither side needs to know the other's
//! internals:
//!
//! - [`EvaluationResult`]: a FHIRPath value (scalar, quantity, collection or object)
//! - [`TypeInfoResult`]: the `namespace.name` pair attached to a value
//! - [`ClassInfo`] / [`ClassInfoElement`]: static shape of a model type
//! - [`ConversionError`]: the recoverable failure of a scalar conversion

mod error;
mod evaluation_result;
mod type_info;

pub use error::ConversionError;
pub use evaluation_result::{EvaluationResult, QuantityValue};
pub use type_info::{ClassInfo, ClassInfoElement, TypeInfoResult};
