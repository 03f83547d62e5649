//! Error types for the generation pipeline.

use std::path::PathBuf;

/// Errors raised while turning a schema into generated source.
///
/// Every variant names the location it concerns: a JSON pointer into the
/// schema document (e.g. `#/definitions/Task`) or a file path. Any error
/// aborts the run; no partial model is emitted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schema could not be read from its file, stdin, or URL.
    #[error("schema source unavailable: {locator}: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// Malformed JSON, or a document that is not a valid schema.
    #[error("schema parse error at {pointer}: {message}")]
    SchemaParse { pointer: String, message: String },

    /// A same-document `$ref` points at nothing.
    #[error("unresolved reference `{reference}` at {pointer}")]
    UnresolvedReference { reference: String, pointer: String },

    /// A `$ref` into another document.
    #[error(
        "unsupported reference `{reference}` at {pointer}: only same-document references are supported"
    )]
    UnsupportedReference { reference: String, pointer: String },

    /// Constraints that cannot be projected onto one type.
    #[error("schema conflict at {pointer}: {message}")]
    SchemaConflict { pointer: String, message: String },

    /// A name is already held by another schema path.
    ///
    /// Raised by [`NameRegistry`](crate::naming::NameRegistry) when claiming a
    /// name; disambiguation consumes it, so callers never see it.
    #[error("name `{name}` requested by {pointer} is already assigned")]
    NameCollision { pointer: String, name: String },

    /// Writing the generated output failed.
    #[error("failed to write {}: {source}", path.display())]
    EmissionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn parse(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaParse {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub(crate) fn conflict(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaConflict {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    /// The schema pointer, locator, or file path this error is about.
    pub fn location(&self) -> String {
        match self {
            Error::SourceUnavailable { locator, .. } => locator.clone(),
            Error::SchemaParse { pointer, .. }
            | Error::UnresolvedReference { pointer, .. }
            | Error::UnsupportedReference { pointer, .. }
            | Error::SchemaConflict { pointer, .. }
            | Error::NameCollision { pointer, .. } => pointer.clone(),
            Error::EmissionIo { path, .. } => path.display().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
