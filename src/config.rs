//! Deployment configuration.
//!
//! Thresholds default to the values the public page has always used; every
//! one can be overridden with a `FLOODWATCH_*` environment variable. The LINE
//! channel secret comes from `LINE_CHANNEL_SECRET`.

use std::fmt;
use std::str::FromStr;

use ::config::{Config, Environment, Map};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MIN_REPORTS: usize = 3;
pub const DEFAULT_FLOODING_RATIO: f64 = 0.60;
pub const DEFAULT_MAX_DEPTH_SPREAD: f64 = 0.3;

const ENV_PREFIX: &str = "FLOODWATCH";
const CHAT_ENV_PREFIX: &str = "LINE";

const KEY_VARIANT: &str = "FLOODWATCH_VARIANT";
const KEY_MIN_REPORTS: &str = "FLOODWATCH_MIN_REPORTS";
const KEY_FLOODING_RATIO: &str = "FLOODWATCH_FLOODING_RATIO";
const KEY_MAX_DEPTH_SPREAD: &str = "FLOODWATCH_MAX_DEPTH_SPREAD";

/// Which kind of reading a deployment collects. One per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "snake_case")]
pub enum ConsensusVariant {
    Depth,
    Impact,
}

impl ConsensusVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusVariant::Depth => "depth",
            ConsensusVariant::Impact => "impact",
        }
    }
}

impl fmt::Display for ConsensusVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsensusVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depth" => Ok(ConsensusVariant::Depth),
            "impact" | "category" => Ok(ConsensusVariant::Impact),
            _ => Err(ConfigError::Unparseable {
                key: KEY_VARIANT,
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ConsensusVariant {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Thresholds for the consensus decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_variant")]
    pub variant: ConsensusVariant,

    /// Below this many reports the page keeps "monitoring".
    #[serde(default = "default_min_reports")]
    pub min_reports: usize,

    /// Share of flooded reports needed to assert flooding (inclusive).
    #[serde(default = "default_flooding_ratio")]
    pub flooding_ratio: f64,

    /// Largest max-min depth spread still treated as agreement (inclusive).
    #[serde(default = "default_max_depth_spread")]
    pub max_depth_spread: f64,
}

fn default_variant() -> ConsensusVariant {
    ConsensusVariant::Impact
}

fn default_min_reports() -> usize {
    DEFAULT_MIN_REPORTS
}

fn default_flooding_ratio() -> f64 {
    DEFAULT_FLOODING_RATIO
}

fn default_max_depth_spread() -> f64 {
    DEFAULT_MAX_DEPTH_SPREAD
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self::for_variant(default_variant())
    }
}

impl ConsensusConfig {
    pub fn for_variant(variant: ConsensusVariant) -> Self {
        Self {
            variant,
            min_reports: DEFAULT_MIN_REPORTS,
            flooding_ratio: DEFAULT_FLOODING_RATIO,
            max_depth_spread: DEFAULT_MAX_DEPTH_SPREAD,
        }
    }

    /// Load from `FLOODWATCH_*` variables. Missing keys keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_reports == 0 {
            return Err(ConfigError::OutOfRange {
                key: KEY_MIN_REPORTS,
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.flooding_ratio > 0.0 && self.flooding_ratio <= 1.0) {
            return Err(ConfigError::OutOfRange {
                key: KEY_FLOODING_RATIO,
                reason: format!("{} is outside (0, 1]", self.flooding_ratio),
            });
        }
        if !self.max_depth_spread.is_finite() || self.max_depth_spread < 0.0 {
            return Err(ConfigError::OutOfRange {
                key: KEY_MAX_DEPTH_SPREAD,
                reason: format!("{} is not a non-negative number", self.max_depth_spread),
            });
        }
        Ok(())
    }
}

/// LINE messaging settings. The webhook is disabled without a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub channel_secret: Option<String>,
}

impl ChatConfig {
    /// Load from `LINE_CHANNEL_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(CHAT_ENV_PREFIX))
    }

    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(CHAT_ENV_PREFIX).source(Some(vars)))
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(Self {
            channel_secret: config.channel_secret.filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.channel_secret.is_some()
    }
}
