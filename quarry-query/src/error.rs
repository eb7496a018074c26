//! Error types for building and decoding request bodies.

use std::fmt;
use thiserror::Error;

/// Stable error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required attribute is absent or empty.
    MissingRequired,
    /// A string value is outside its declared set.
    InvalidEnum,
    /// A numeric value violates its bounds.
    InvalidRange,
    /// A tag is not present in the clause, rule, function or field registry.
    UnknownKind,
    /// The JSON shape is not acceptable for its context.
    Structural,
    /// The JSON reader failed.
    DecodePassthrough,
}

impl ErrorKind {
    /// Get the category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequired => "missing-required",
            ErrorKind::InvalidEnum => "invalid-enum",
            ErrorKind::InvalidRange => "invalid-range",
            ErrorKind::UnknownKind => "unknown-kind",
            ErrorKind::Structural => "structural",
            ErrorKind::DecodePassthrough => "decode-passthrough",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query DSL error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DslError {
    /// Required attribute absent.
    #[error("missing required attribute `{field}`")]
    MissingRequired {
        /// Attribute name.
        field: String,
    },

    /// Value outside an enumerated set.
    #[error("invalid value `{value}` for `{field}`, expected one of: {}", .allowed.join(", "))]
    InvalidEnum {
        /// Attribute name.
        field: String,
        /// Offending value.
        value: String,
        /// Accepted values.
        allowed: Vec<String>,
    },

    /// Numeric value out of bounds.
    #[error("`{field}` out of range: {value} not in {bounds}")]
    InvalidRange {
        /// Attribute name.
        field: String,
        /// Offending value.
        value: String,
        /// Human readable bounds, e.g. `[0, 1]`.
        bounds: String,
    },

    /// Unregistered tag.
    #[error("unknown {family} kind `{kind}`")]
    UnknownKind {
        /// Registry that was consulted (`query`, `rule`, `function`, `field`).
        family: &'static str,
        /// Offending tag.
        kind: String,
    },

    /// Unexpected JSON shape.
    #[error("{message}")]
    Structural {
        /// Description of the mismatch.
        message: String,
    },

    /// JSON reader failure, forwarded verbatim.
    #[error("{0}")]
    Decode(String),

    /// An error located at a sub-element path.
    #[error("{path}: {source}")]
    At {
        /// Dotted path of the sub-element.
        path: String,
        /// Underlying error.
        source: Box<DslError>,
    },

    /// Several sub-elements failed.
    #[error("{}", join(.0))]
    Many(Vec<DslError>),
}

fn join(errors: &[DslError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DslError {
    /// Required attribute `field` is missing.
    pub fn missing(field: impl Into<String>) -> Self {
        DslError::MissingRequired {
            field: field.into(),
        }
    }

    /// `value` is not one of `allowed` for `field`.
    pub fn invalid_enum(field: impl Into<String>, value: impl Into<String>, allowed: &[&str]) -> Self {
        DslError::InvalidEnum {
            field: field.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `value` violates `bounds` for `field`.
    pub fn invalid_range(
        field: impl Into<String>,
        value: impl fmt::Display,
        bounds: impl Into<String>,
    ) -> Self {
        DslError::InvalidRange {
            field: field.into(),
            value: value.to_string(),
            bounds: bounds.into(),
        }
    }

    /// `kind` is not registered in `family`.
    pub fn unknown_kind(family: &'static str, kind: impl Into<String>) -> Self {
        DslError::UnknownKind {
            family,
            kind: kind.into(),
        }
    }

    /// The JSON shape is wrong.
    pub fn structural(message: impl Into<String>) -> Self {
        DslError::Structural {
            message: message.into(),
        }
    }

    /// Locate this error at `path`. Errors that already carry a path keep it.
    pub fn at(self, path: impl Into<String>) -> Self {
        match self {
            located @ DslError::At { .. } => located,
            DslError::Many(errors) => {
                let path = path.into();
                DslError::Many(errors.into_iter().map(|e| e.at(path.clone())).collect())
            }
            other => DslError::At {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Combine sub-element errors; a single error is returned unchanged.
    pub fn many(mut errors: Vec<DslError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            DslError::Many(errors)
        }
    }

    /// The stable category of this error.
    ///
    /// For an aggregate this is the category of its first member.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DslError::MissingRequired { .. } => ErrorKind::MissingRequired,
            DslError::InvalidEnum { .. } => ErrorKind::InvalidEnum,
            DslError::InvalidRange { .. } => ErrorKind::InvalidRange,
            DslError::UnknownKind { .. } => ErrorKind::UnknownKind,
            DslError::Structural { .. } => ErrorKind::Structural,
            DslError::Decode(_) => ErrorKind::DecodePassthrough,
            DslError::At { source, .. } => source.kind(),
            DslError::Many(errors) => errors
                .first()
                .map(DslError::kind)
                .unwrap_or(ErrorKind::Structural),
        }
    }

    /// The offending attribute name, when the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            DslError::MissingRequired { field }
            | DslError::InvalidEnum { field, .. }
            | DslError::InvalidRange { field, .. } => Some(field),
            DslError::At { source, .. } => source.field(),
            DslError::Many(errors) => errors.first().and_then(DslError::field),
            _ => None,
        }
    }

    /// The sub-element path, when the error is located.
    pub fn path(&self) -> Option<&str> {
        match self {
            DslError::At { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Flatten aggregates into a list of located leaf errors.
    pub fn flatten(self) -> Vec<DslError> {
        match self {
            DslError::Many(errors) => errors.into_iter().flat_map(DslError::flatten).collect(),
            DslError::At { path, source } => match *source {
                DslError::Many(errors) => errors
                    .into_iter()
                    .flat_map(DslError::flatten)
                    .map(|e| e.at(path.clone()))
                    .collect(),
                leaf => vec![DslError::At {
                    path,
                    source: Box::new(leaf),
                }],
            },
            leaf => vec![leaf],
        }
    }
}

impl From<serde_json::Error> for DslError {
    fn from(err: serde_json::Error) -> Self {
        DslError::Decode(err.to_string())
    }
}

/// Result type alias for query DSL operations.
pub type Result<T> = std::result::Result<T, DslError>;

/// Aggregated failure of a root document decode.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", join(.errors))]
pub struct DecodeError {
    /// Located leaf errors, in document order.
    pub errors: Vec<DslError>,
    /// Keys that were not understood anywhere in the document.
    pub unknown_keys: Vec<String>,
}

impl DecodeError {
    /// Build from a (possibly aggregate) error and the unknown-key diagnostic.
    pub fn new(error: DslError, unknown_keys: Vec<String>) -> Self {
        Self {
            errors: error.flatten(),
            unknown_keys,
        }
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first error.
    pub fn first(&self) -> Option<&DslError> {
        self.errors.first()
    }

    /// Categories of every error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(DslError::kind).collect()
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.into(), Vec::new())
    }
}

impl From<DslError> for DecodeError {
    fn from(err: DslError) -> Self {
        Self::new(err, Vec::new())
    }
}

/// Per-field failures of a mapping definition.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} mapping error(s): {}", .errors.len(), join(.errors))]
pub struct MappingError {
    /// One located error per failing field.
    pub errors: Vec<DslError>,
}

impl MappingError {
    /// Create from located errors.
    pub fn new(errors: Vec<DslError>) -> Self {
        Self {
            errors: errors.into_iter().flat_map(DslError::flatten).collect(),
        }
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors located at `field`.
    pub fn field_errors(&self, field: &str) -> Vec<&DslError> {
        self.errors
            .iter()
            .filter(|e| e.path() == Some(field))
            .collect()
    }
}

impl From<DslError> for MappingError {
    fn from(err: DslError) -> Self {
        Self::new(vec![err])
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(vec![err.into()])
    }
}

/// A builder failure: the partially populated value plus the first blocking
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T, E = DslError> {
    /// What could be built before validation stopped.
    pub value: T,
    /// The first blocking error.
    pub error: E,
}

impl<T, E> Partial<T, E> {
    /// Pair a partial value with its error.
    pub fn new(value: T, error: E) -> Self {
        Self { value, error }
    }

    /// Drop the partial value.
    pub fn into_error(self) -> E {
        self.error
    }

    /// Transform the partial value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Partial<U, E> {
        Partial {
            value: f(self.value),
            error: self.error,
        }
    }
}

impl<T, E: fmt::Display> fmt::Display for Partial<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: fmt::Debug, E: std::error::Error + 'static> std::error::Error for Partial<T, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Partial<T>> for DslError {
    fn from(partial: Partial<T>) -> Self {
        partial.error
    }
}

/// Result of a `*Params` conversion.
pub type BuildResult<T> = std::result::Result<T, Partial<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_location() {
        let err = DslError::missing("values").at("query.ids");
        assert_eq!(err.kind(), ErrorKind::MissingRequired);
        assert_eq!(err.field(), Some("values"));
        assert_eq!(err.path(), Some("query.ids"));
        assert_eq!(err.to_string(), "query.ids: missing required attribute `values`");
    }

    #[test]
    fn test_at_keeps_innermost_path() {
        let err = DslError::missing("field").at("bool.must[0].term").at("bool");
        assert_eq!(err.path(), Some("bool.must[0].term"));
    }

    #[test]
    fn test_flatten_aggregates() {
        let err = DslError::Many(vec![
            DslError::missing("path").at("a"),
            DslError::unknown_kind("field", "strnig"),
        ])
        .at("mappings");

        let flat = err.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].path(), Some("a"));
        assert_eq!(flat[1].path(), Some("mappings"));
        assert_eq!(flat[1].kind(), ErrorKind::UnknownKind);
    }

    #[test]
    fn test_many_single_is_unwrapped() {
        let err = DslError::many(vec![DslError::structural("bad")]);
        assert_eq!(err, DslError::structural("bad"));
    }

    #[test]
    fn test_invalid_enum_message() {
        let err = DslError::invalid_enum("relation", "OVER", &["INTERSECTS", "CONTAINS", "WITHIN"]);
        assert_eq!(
            err.to_string(),
            "invalid value `OVER` for `relation`, expected one of: INTERSECTS, CONTAINS, WITHIN"
        );
        assert_eq!(ErrorKind::InvalidEnum.as_str(), "invalid-enum");
    }

    #[test]
    fn test_partial_into_dsl_error() {
        fn build() -> std::result::Result<u8, DslError> {
            let partial: BuildResult<u8> = Err(Partial::new(7, DslError::missing("id")));
            Ok(partial?)
        }
        assert_eq!(build().unwrap_err().kind(), ErrorKind::MissingRequired);
    }

    #[test]
    fn test_serde_error_passthrough() {
        let err: DslError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::DecodePassthrough);
    }
}
