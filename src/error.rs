//! Error types for the composition library.
//!
//! This module defines all error types that can occur while assembling an
//! output document from fresh content and imported pages.

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document composition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced object not found in the source document.
    ///
    /// Recoverable inside the object graph copier: the missing object is
    /// replaced by a null object and copying continues.
    #[error("Object not found in source: {0} 0 R")]
    ObjectNotFound(u32),

    /// Structurally corrupt source data. Fatal: the output document would be
    /// unsound if composition continued.
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Template id was never registered with the importer.
    #[error("Unknown template: {0}")]
    UnknownTemplate(usize),

    /// A dependent page dimension cannot be computed because the template's
    /// natural size is degenerate and no explicit size was given.
    #[error("Cannot resolve page size for template {0}: natural size is zero")]
    UnresolvablePageSize(usize),

    /// Source reader id was never registered.
    #[error("Unknown source reader: {0}")]
    UnknownSource(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the copier may degrade locally instead of aborting finalize.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ObjectNotFound(_))
    }
}
