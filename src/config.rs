//! Governor configuration file handling
//!
//! Bootstraps an engine instance from a TOML file. Durations use humantime
//! syntax ("1day", "36h"), amounts are whole tokens, identities are hex.
//!
//! The file only seeds a new engine. Once running, parameters, roles and
//! whitelists change through the engine's own entry points and live in its
//! state snapshot, not here.

use crate::error::GovernanceError;
use crate::governance::{GovernanceParams, GovernanceSetup};
use crate::types::{tokens, Address, ParseIdError, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid duration for {field} ('{value}'): {reason}")]
    Duration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid identity in {field} ('{value}'): {source}")]
    Identity {
        field: &'static str,
        value: String,
        source: ParseIdError,
    },

    #[error("invalid governance settings: {0}")]
    Governance(#[from] GovernanceError),
}

/// Engine bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub roles: RolesConfig,

    #[serde(default)]
    pub whitelist: WhitelistConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[governance]`: engine identity and initial parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Custody address of the engine (hex).
    pub engine_address: String,

    #[serde(default = "default_voting_duration")]
    pub voting_duration: String,

    #[serde(default = "default_min_voting_duration")]
    pub min_voting_duration: String,

    #[serde(default = "default_max_voting_duration")]
    pub max_voting_duration: String,

    /// Whole tokens.
    #[serde(default = "default_quorum")]
    pub quorum: u64,

    /// Whole tokens.
    #[serde(default = "default_proposal_threshold")]
    pub proposal_threshold: u64,

    /// Whole tokens.
    #[serde(default = "default_stake")]
    pub stake: u64,

    #[serde(default = "default_refund_percentage")]
    pub defeated_refund_percentage: u8,

    #[serde(default = "default_refund_percentage")]
    pub canceled_refund_percentage: u8,

    #[serde(default = "default_refund_percentage")]
    pub expired_refund_percentage: u8,
}

/// `[roles]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub administrators: Vec<String>,

    #[serde(default)]
    pub guardians: Vec<String>,
}

/// `[whitelist]`: General proposal selectors and targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub selectors: Vec<String>,

    #[serde(default)]
    pub targets: Vec<String>,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_voting_duration() -> String {
    "1day".to_string()
}

fn default_min_voting_duration() -> String {
    "1h".to_string()
}

fn default_max_voting_duration() -> String {
    "14days".to_string()
}

fn default_quorum() -> u64 {
    500
}

fn default_proposal_threshold() -> u64 {
    100
}

fn default_stake() -> u64 {
    1
}

fn default_refund_percentage() -> u8 {
    50
}

fn parse_secs(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    humantime::parse_duration(value)
        .map(|d: Duration| d.as_secs())
        .map_err(|e| ConfigError::Duration {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.parse().map_err(|source| ConfigError::Identity {
        field,
        value: value.to_string(),
        source,
    })
}

fn parse_selector(value: &str) -> Result<Selector, ConfigError> {
    value.parse().map_err(|source| ConfigError::Identity {
        field: "whitelist.selectors",
        value: value.to_string(),
        source,
    })
}

impl GovernorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, contents).map_err(write_err)?;
        Ok(())
    }

    /// Engine parameters described by `[governance]`, validated.
    pub fn params(&self) -> Result<GovernanceParams, ConfigError> {
        let g = &self.governance;
        let params = GovernanceParams {
            voting_duration: parse_secs("governance.voting_duration", &g.voting_duration)?,
            min_voting_duration: parse_secs(
                "governance.min_voting_duration",
                &g.min_voting_duration,
            )?,
            max_voting_duration: parse_secs(
                "governance.max_voting_duration",
                &g.max_voting_duration,
            )?,
            quorum: tokens(g.quorum),
            proposal_threshold: tokens(g.proposal_threshold),
            stake_amount: tokens(g.stake),
            defeated_refund_percentage: g.defeated_refund_percentage,
            canceled_refund_percentage: g.canceled_refund_percentage,
            expired_refund_percentage: g.expired_refund_percentage,
        };
        params.validate()?;
        Ok(params)
    }

    /// Everything `Governor::new` needs apart from the collaborators.
    pub fn to_setup(&self) -> Result<GovernanceSetup, ConfigError> {
        let params = self.params()?;
        let engine_address = parse_address("governance.engine_address", &self.governance.engine_address)?;

        let administrators = self
            .roles
            .administrators
            .iter()
            .map(|a| parse_address("roles.administrators", a))
            .collect::<Result<Vec<_>, _>>()?;
        if administrators.is_empty() {
            return Err(GovernanceError::LastAdministrator.into());
        }
        let guardians = self
            .roles
            .guardians
            .iter()
            .map(|a| parse_address("roles.guardians", a))
            .collect::<Result<Vec<_>, _>>()?;
        let allowed_selectors = self
            .whitelist
            .selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let allowed_targets = self
            .whitelist
            .targets
            .iter()
            .map(|t| parse_address("whitelist.targets", t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GovernanceSetup {
            engine_address,
            params,
            administrators,
            guardians,
            allowed_selectors,
            allowed_targets,
        })
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(engine_address: &Address, administrator: &Address) -> String {
        format!(
            r#"# Governance engine configuration
#
# Seeds a new engine instance. After startup, parameters, roles and
# whitelists are changed through governance itself, not by editing this file.

[governance]
# Custody address holding proposer stakes
engine_address = "{engine_address}"

# Voting window and its bounds (humantime syntax: "36h", "2days")
voting_duration = "1day"
min_voting_duration = "1h"
max_voting_duration = "14days"

# Whole tokens
quorum = 500
proposal_threshold = 100
stake = 1

# Share of the stake returned when a proposal ends without executing (0-100)
defeated_refund_percentage = 50
canceled_refund_percentage = 50
expired_refund_percentage = 50

[roles]
administrators = ["{administrator}"]
guardians = []

[whitelist]
# Four-byte call selectors and call targets allowed in General proposals
selectors = []
targets = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/stakegov/stakegov.log"
"#,
            engine_address = engine_address,
            administrator = administrator,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        path: &Path,
        engine_address: &Address,
        administrator: &Address,
    ) -> Result<(), ConfigError> {
        let contents = Self::generate_default_toml(engine_address, administrator);
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, contents).map_err(write_err)?;
        Ok(())
    }
}
