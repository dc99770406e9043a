use std::path::Path;

use strata_core::config::LedgerConfig;
use strata_core::error::ConfigError;
use strata_documents::DocumentRegistry;
use strata_ledger::Ledger;

/// A security token: the partitioned ledger plus its document registry
///
/// Both components share the configured owner.
#[derive(Debug, Clone)]
pub struct SecurityToken {
    ledger: Ledger,
    documents: DocumentRegistry,
}

impl SecurityToken {
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        let documents = DocumentRegistry::new(config.owner);
        let ledger = Ledger::new(config)?;
        log::info!("Security token {} ready", ledger.symbol());
        Ok(Self { ledger, documents })
    }

    /// Build a token from a JSON configuration file
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        Self::new(LedgerConfig::from_file(path)?)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentRegistry {
        &mut self.documents
    }
}
