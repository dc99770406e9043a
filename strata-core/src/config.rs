use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::id::Principal;
use crate::partition::Partition;

/// Label of the partition used by non-partitioned operations unless configured
pub const DEFAULT_PARTITION_LABEL: &str = "Default";

/// Construction-time authority and metadata for a ledger
///
/// Holds the principals that gate privileged operations so the ledger never
/// consults ambient state. Missing fields fall back to [`LedgerConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Token name
    pub name: String,

    /// Token symbol
    pub symbol: String,

    /// Display decimals; balances themselves are integers
    pub decimals: u8,

    /// The issuing authority: issues tokens and flips the finalization switches
    pub owner: Principal,

    /// The privileged controller; the null principal disables the override
    pub controller: Principal,

    /// Partition used by issue/transfer/redeem calls that name no partition
    pub default_partition: Partition,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: "Strata Security Token".to_string(),
            symbol: "STRATA".to_string(),
            decimals: 18,
            owner: Principal::NULL,
            controller: Principal::NULL,
            default_partition: Partition::new(DEFAULT_PARTITION_LABEL)
                .unwrap_or(Partition::RESERVED),
        }
    }
}

impl LedgerConfig {
    /// Create a configuration with the given owner and controller
    pub fn new(owner: Principal, controller: Principal) -> Self {
        Self {
            owner,
            controller,
            ..Self::default()
        }
    }

    /// Set the token name and symbol
    pub fn with_metadata(mut self, name: &str, symbol: &str, decimals: u8) -> Self {
        self.name = name.to_string();
        self.symbol = symbol.to_string();
        self.decimals = decimals;
        self
    }

    /// Set the partition used by non-partitioned operations
    pub fn with_default_partition(mut self, partition: Partition) -> Self {
        self.default_partition = partition;
        self
    }

    /// Parse and validate a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        log::debug!("Loaded ledger configuration from {}", path.display());
        Ok(config)
    }

    /// Check that the configuration describes a usable ledger
    ///
    /// # Returns
    /// * `Ok(())` - The owner is set, differs from the controller, and the
    ///   default partition is not reserved
    /// * `Err(ConfigError::Invalid)` - Otherwise
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_null() {
            return Err(ConfigError::Invalid("owner must not be the null principal".to_string()));
        }
        if self.owner == self.controller {
            return Err(ConfigError::Invalid(
                "owner and controller must be different principals".to_string(),
            ));
        }
        if self.default_partition.is_reserved() {
            return Err(ConfigError::Invalid(
                "default partition must not be reserved".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the controller override starts enabled
    pub fn has_controller(&self) -> bool {
        !self.controller.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.symbol, "STRATA");
        assert_eq!(config.decimals, 18);
        assert_eq!(config.default_partition.label(), Some(DEFAULT_PARTITION_LABEL));
        assert!(!config.has_controller());

        // A default configuration has no owner and is rejected
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate() {
        let owner = Principal::from_label("owner");
        let controller = Principal::from_label("controller");

        assert!(LedgerConfig::new(owner, controller).validate().is_ok());
        assert!(LedgerConfig::new(owner, Principal::NULL).validate().is_ok());

        // Owner and controller must differ
        assert!(LedgerConfig::new(owner, owner).validate().is_err());

        let reserved = LedgerConfig::new(owner, controller)
            .with_default_partition(Partition::RESERVED);
        assert!(reserved.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let owner = Principal::from_label("owner");
        let json = format!(
            r#"{{ "name": "Bond", "symbol": "BND", "owner": "{}", "default_partition": "Debt" }}"#,
            owner
        );

        let config = LedgerConfig::from_json(&json).unwrap();
        assert_eq!(config.name, "Bond");
        assert_eq!(config.symbol, "BND");
        assert_eq!(config.decimals, 18);
        assert_eq!(config.owner, owner);
        assert_eq!(config.controller, Principal::NULL);
        assert_eq!(config.default_partition, Partition::new("Debt").unwrap());
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            LedgerConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LedgerConfig::from_json(r#"{ "owner": "0x12" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LedgerConfig::from_json("{}"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let owner = Principal::from_label("owner");
        let controller = Principal::from_label("controller");
        let config = LedgerConfig::new(owner, controller).with_metadata("Token", "TOKEN", 6);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            LedgerConfig::from_file(&missing),
            Err(ConfigError::Io(_))
        ));
    }
}
