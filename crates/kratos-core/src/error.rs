use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Failure categories a pipeline run can end with.
///
/// `NotAQuery` through `UnboundedPath` are validator rejections; the rest are
/// capability or execution failures. Every kind is terminal for the run.
///
/// The wire name is `as_str`; serde, `Display` and `FromStr` all go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SchemaUnavailable,
    ClassificationFailure,
    SynthesisFailure,
    NotAQuery,
    WriteOperationForbidden,
    UnknownLabel,
    UnknownRelationshipType,
    UnknownProperty,
    UnboundedPath,
    ExecutionTimeout,
    ExecutionError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 11] = [
        Self::SchemaUnavailable,
        Self::ClassificationFailure,
        Self::SynthesisFailure,
        Self::NotAQuery,
        Self::WriteOperationForbidden,
        Self::UnknownLabel,
        Self::UnknownRelationshipType,
        Self::UnknownProperty,
        Self::UnboundedPath,
        Self::ExecutionTimeout,
        Self::ExecutionError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaUnavailable => "schema_unavailable",
            Self::ClassificationFailure => "classification_failure",
            Self::SynthesisFailure => "synthesis_failure",
            Self::NotAQuery => "not_a_query",
            Self::WriteOperationForbidden => "write_operation_forbidden",
            Self::UnknownLabel => "unknown_label",
            Self::UnknownRelationshipType => "unknown_relationship_type",
            Self::UnknownProperty => "unknown_property",
            Self::UnboundedPath => "unbounded_path",
            Self::ExecutionTimeout => "execution_timeout",
            Self::ExecutionError => "execution_error",
        }
    }

    /// Whether this kind was produced by the query validator.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotAQuery
                | Self::WriteOperationForbidden
                | Self::UnknownLabel
                | Self::UnknownRelationshipType
                | Self::UnknownProperty
                | Self::UnboundedPath
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown error kind: {s}"))
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned by `ask` and by each individual pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Intent classification failed: {0}")]
    ClassificationFailure(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Query rejected ({kind}): {detail}")]
    Rejected { kind: ErrorKind, detail: String },

    #[error("Query execution timed out after {timeout_ms}ms")]
    ExecutionTimeout { timeout_ms: u64 },

    #[error("Query execution failed: {0}")]
    ExecutionError(String),
}

impl PipelineError {
    /// The taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaUnavailable(_) => ErrorKind::SchemaUnavailable,
            Self::ClassificationFailure(_) => ErrorKind::ClassificationFailure,
            Self::SynthesisFailure(_) => ErrorKind::SynthesisFailure,
            Self::Rejected { kind, .. } => *kind,
            Self::ExecutionTimeout { .. } => ErrorKind::ExecutionTimeout,
            Self::ExecutionError(_) => ErrorKind::ExecutionError,
        }
    }

    /// The actionable part of the error: offending token, label, duration, etc.
    pub fn detail(&self) -> String {
        match self {
            Self::SchemaUnavailable(d)
            | Self::ClassificationFailure(d)
            | Self::SynthesisFailure(d)
            | Self::ExecutionError(d) => d.clone(),
            Self::Rejected { detail, .. } => detail.clone(),
            Self::ExecutionTimeout { timeout_ms } => format!("{timeout_ms}ms"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
