use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::id::Principal;

use crate::error::DocumentError;

/// Length of a document content hash
pub const DOCUMENT_HASH_LEN: usize = 32;

/// A document attached to the token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Where the document can be fetched
    pub uri: String,

    /// Hash of the document contents; all zeros when none was supplied
    pub document_hash: [u8; DOCUMENT_HASH_LEN],

    /// UNIX time of the last update, zero for an unknown document
    pub last_modified: i64,
}

impl Document {
    /// Whether this is the zero-valued placeholder for an unknown name
    pub fn is_empty(&self) -> bool {
        self.uri.is_empty() && self.last_modified == 0
    }
}

/// Changes recorded by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentEvent {
    DocumentUpdated {
        name: String,
        uri: String,
        document_hash: [u8; DOCUMENT_HASH_LEN],
    },
    DocumentRemoved {
        name: String,
        uri: String,
        document_hash: [u8; DOCUMENT_HASH_LEN],
    },
}

impl fmt::Display for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentEvent::DocumentUpdated {
                name,
                uri,
                document_hash,
            } => write!(f, "DocumentUpdated({}, {}, 0x{})", name, uri, hex::encode(document_hash)),
            DocumentEvent::DocumentRemoved {
                name,
                uri,
                document_hash,
            } => write!(f, "DocumentRemoved({}, {}, 0x{})", name, uri, hex::encode(document_hash)),
        }
    }
}

/// Named documents managed by a single owner
///
/// Names are listed in insertion order. Removing a name moves the last name
/// into its slot.
#[derive(Debug, Clone)]
pub struct DocumentRegistry {
    owner: Principal,
    documents: HashMap<String, Document>,
    names: Vec<String>,
    /// Mapping from name to its slot in `names`
    index: HashMap<String, usize>,
    events: Vec<DocumentEvent>,
}

impl DocumentRegistry {
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            documents: HashMap::new(),
            names: Vec::new(),
            index: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    /// Add a document or replace the one stored under `name`
    ///
    /// # Parameters
    /// * `caller` - Must be the registry owner
    /// * `name` - Non-empty document name
    /// * `uri` - Non-empty location of the document
    /// * `document_hash` - Content hash; may be all zeros
    pub fn set_document(
        &mut self,
        caller: Principal,
        name: &str,
        uri: &str,
        document_hash: [u8; DOCUMENT_HASH_LEN],
    ) -> Result<(), DocumentError> {
        self.require_owner(&caller, "set a document")?;
        if name.is_empty() {
            return Err(DocumentError::EmptyName);
        }
        if uri.is_empty() {
            return Err(DocumentError::EmptyUri);
        }

        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.names.len());
            self.names.push(name.to_string());
        }
        self.documents.insert(
            name.to_string(),
            Document {
                uri: uri.to_string(),
                document_hash,
                last_modified: chrono::Utc::now().timestamp(),
            },
        );

        log::info!("Document {} set to {}", name, uri);
        self.events.push(DocumentEvent::DocumentUpdated {
            name: name.to_string(),
            uri: uri.to_string(),
            document_hash,
        });
        Ok(())
    }

    /// Look up a document; unknown names yield a zero-valued document
    pub fn get_document(&self, name: &str) -> Document {
        self.documents.get(name).cloned().unwrap_or_default()
    }

    /// Names of all registered documents
    pub fn get_all_documents(&self) -> &[String] {
        &self.names
    }

    /// Delete the document stored under `name`
    pub fn remove_document(&mut self, caller: Principal, name: &str) -> Result<(), DocumentError> {
        self.require_owner(&caller, "remove a document")?;
        let Some(document) = self.documents.remove(name) else {
            log::warn!("Cannot remove unknown document {}", name);
            return Err(DocumentError::DocumentNotFound(name.to_string()));
        };

        if let Some(slot) = self.index.remove(name) {
            self.names.swap_remove(slot);
            if let Some(moved) = self.names.get(slot) {
                self.index.insert(moved.clone(), slot);
            }
        }

        log::info!("Document {} removed", name);
        self.events.push(DocumentEvent::DocumentRemoved {
            name: name.to_string(),
            uri: document.uri,
            document_hash: document.document_hash,
        });
        Ok(())
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> &[DocumentEvent] {
        &self.events
    }

    /// Drain the recorded events
    pub fn take_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }

    fn require_owner(&self, caller: &Principal, action: &str) -> Result<(), DocumentError> {
        if *caller == self.owner {
            return Ok(());
        }
        log::warn!("{} may not {}", caller, action);
        Err(DocumentError::NotAuthorized(format!(
            "{} may not {}",
            caller, action
        )))
    }
}
