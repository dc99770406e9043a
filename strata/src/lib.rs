//! STRATA partitioned security-token ledger
//!
//! This crate re-exports the components of the STRATA system and ties the
//! ledger and the document registry together in [`SecurityToken`].

pub mod token;

pub use strata_core::*;
pub use strata_ledger::*;
pub use strata_documents::{Document, DocumentError, DocumentEvent, DocumentRegistry, DOCUMENT_HASH_LEN};
pub use token::SecurityToken;
