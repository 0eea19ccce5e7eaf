//! Core error types for process synthesis
//!
//! Structural problems in the raw process are fatal and carry the offending
//! node reference. Layout never fails on a missing anchor; see
//! [`LayoutDiagnostic`](crate::plugins::bpmn::LayoutDiagnostic) for that.

use thiserror::Error;

/// Errors raised by the synthesis pipeline
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Malformed process: {reason} (at '{reference}')")]
    MalformedProcess { reference: String, reason: String },

    #[error("Duplicate identifier: '{id}'")]
    DuplicateIdentifier { id: String },

    #[error("Document error: {message}")]
    Document { message: String },

    #[error("Ontology error: {message}")]
    Ontology { message: String },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Create a new malformed-process error pointing at `reference`
    pub fn malformed(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedProcess {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a new duplicate-identifier error
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateIdentifier { id: id.into() }
    }

    /// Create a new document error
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Create a new ontology error
    pub fn ontology(message: impl Into<String>) -> Self {
        Self::Ontology {
            message: message.into(),
        }
    }

    /// The node reference this error points at, when there is one
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::MalformedProcess { reference, .. } => Some(reference),
            Self::DuplicateIdentifier { id } => Some(id),
            _ => None,
        }
    }
}
