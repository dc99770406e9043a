pub mod error;
pub mod registry;

pub use error::DocumentError;
pub use registry::{Document, DocumentEvent, DocumentRegistry, DOCUMENT_HASH_LEN};
