use thiserror::Error;

/// Errors raised by the document registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Only the registry owner may change documents
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Document name is empty")]
    EmptyName,

    #[error("Document URI is empty")]
    EmptyUri,

    /// No document is registered under the name
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}
