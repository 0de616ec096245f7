use thiserror::Error;

/// Failure of a scalar conversion such as `to_boolean` or `to_quantity`.
///
/// Always recoverable: an evaluator treats it as "not convertible" and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The source type has no conversion to the requested target.
    #[error("cannot convert a value of type `{from}` to {to}")]
    Unsupported { from: String, to: &'static str },

    /// The conversion exists but the value does not fit the target.
    #[error("value `{value}` of type `{from}` is out of range for {to}")]
    OutOfRange {
        from: String,
        to: &'static str,
        value: String,
    },
}

impl ConversionError {
    pub fn unsupported(from: impl Into<String>, to: &'static str) -> Self {
        ConversionError::Unsupported {
            from: from.into(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_names_both_types() {
        let err = ConversionError::unsupported("CodeableConcept", "Boolean");
        assert_eq!(
            err.to_string(),
            "cannot convert a value of type `CodeableConcept` to Boolean"
        );
    }
}
