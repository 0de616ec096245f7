use std::fmt;

use fhirkit::InvariantViolation;

/// Where in the input a decode error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// JSON input: 1-based line and column.
    LineColumn { line: usize, column: usize },
    /// XML input: byte offset from the start of the document.
    ByteOffset(u64),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::LineColumn { line, column } => write!(f, "line {} column {}", line, column),
            Location::ByteOffset(offset) => write!(f, "byte {}", offset),
        }
    }
}

/// Input that does not match the FHIR wire rules: wrong token kind, unknown
/// field, duplicate value, invalid lexical form, unknown resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// Type name of the enclosing element, when known.
    pub element: Option<String>,
    pub message: String,
    pub location: Option<Location>,
}

impl StructuralError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            element: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn in_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(element) = &self.element {
            write!(f, " (in {})", element)?;
        }
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for StructuralError {}

/// Error types for FHIR serialization and deserialization.
#[derive(Debug)]
pub enum SerdeError {
    /// Malformed input for the target type
    Structural(StructuralError),

    /// The tree cannot be encoded as-is; raised before any output is written
    Invariant(InvariantViolation),

    /// JSON serialization error
    Json(serde_json::Error),

    /// XML syntax or writer error
    #[cfg(feature = "xml")]
    Xml(quick_xml::Error),

    /// IO error during serialization/deserialization
    Io(std::io::Error),

    /// Custom error message
    Custom(String),
}

impl SerdeError {
    /// Classifies a `serde_json` decode error.
    ///
    /// IO failures stay IO errors; everything else is structural, with the
    /// position split out of the message.
    pub fn from_json_decode(err: serde_json::Error) -> Self {
        if err.is_io() {
            return SerdeError::Io(std::io::Error::other(err));
        }
        let (line, column) = (err.line(), err.column());
        let message = err.to_string();
        let suffix = format!(" at line {} column {}", line, column);
        let message = match message.strip_suffix(&suffix) {
            Some(stripped) if line > 0 => stripped,
            _ => &message,
        };
        let error = split_owner(message);
        if line == 0 {
            return SerdeError::Structural(error);
        }
        SerdeError::Structural(error.at(Location::LineColumn { line, column }))
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, SerdeError::Structural(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, SerdeError::Invariant(_))
    }
}

impl fmt::Display for SerdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerdeError::Structural(e) => write!(f, "Structural error: {}", e),
            SerdeError::Invariant(e) => write!(f, "Invariant violation: {}", e),
            SerdeError::Json(e) => write!(f, "JSON error: {}", e),
            #[cfg(feature = "xml")]
            SerdeError::Xml(e) => write!(f, "XML error: {}", e),
            SerdeError::Io(e) => write!(f, "IO error: {}", e),
            SerdeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SerdeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerdeError::Structural(e) => Some(e),
            SerdeError::Invariant(e) => Some(e),
            SerdeError::Json(e) => Some(e),
            #[cfg(feature = "xml")]
            SerdeError::Xml(e) => Some(e),
            SerdeError::Io(e) => Some(e),
            SerdeError::Custom(_) => None,
        }
    }
}

impl From<StructuralError> for SerdeError {
    fn from(err: StructuralError) -> Self {
        SerdeError::Structural(err)
    }
}

impl From<InvariantViolation> for SerdeError {
    fn from(err: InvariantViolation) -> Self {
        SerdeError::Invariant(err)
    }
}

impl From<serde_json::Error> for SerdeError {
    fn from(err: serde_json::Error) -> Self {
        SerdeError::Json(err)
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::Error> for SerdeError {
    fn from(err: quick_xml::Error) -> Self {
        SerdeError::Xml(err)
    }
}

impl From<std::io::Error> for SerdeError {
    fn from(err: std::io::Error) -> Self {
        SerdeError::Io(err)
    }
}

impl From<String> for SerdeError {
    fn from(msg: String) -> Self {
        SerdeError::Custom(msg)
    }
}

impl From<&str> for SerdeError {
    fn from(msg: &str) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::ser::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Structural(StructuralError::new(msg.to_string()))
    }
}

/// Splits a trailing ` in <Type>` off a decoder message.
///
/// The model's decoder ends every message about a field with the type that
/// owns it; other messages are kept whole.
fn split_owner(message: &str) -> StructuralError {
    let Some((head, owner)) = message.rsplit_once(" in ") else {
        return StructuralError::new(message);
    };
    let is_type_name = owner.starts_with(|c: char| c.is_ascii_uppercase())
        && owner.chars().all(|c| c.is_ascii_alphanumeric());
    if is_type_name {
        StructuralError::new(head).in_element(owner)
    } else {
        StructuralError::new(message)
    }
}

/// Result type alias for FHIR serialization operations
pub type Result<T> = std::result::Result<T, SerdeError>;
