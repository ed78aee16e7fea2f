//! Engine configuration
//!
//! Policies for the open-ended parts of dispatch. Read from the `[reflect]`
//! table of a TOML manifest:
//!
//! ```toml
//! [reflect]
//! ambiguity = "first_declared"
//! inference = "require_consistent"
//! include_inherited_members = true
//! trace_cache = false
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How overload resolution treats more than one applicable method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Fail with `AmbiguousMatch`
    #[default]
    Reject,
    /// Pick the first applicable method in declaration order
    FirstDeclared,
}

/// How generic inference treats a type parameter bound by several arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePolicy {
    /// The first non-null argument decides
    #[default]
    FirstWins,
    /// All non-null arguments must agree
    RequireConsistent,
}

/// Reflection engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overload tie handling
    pub ambiguity: AmbiguityPolicy,
    /// Generic inference consistency
    pub inference: InferencePolicy,
    /// Method and field listings include base-type members
    pub include_inherited_members: bool,
    /// Emit `trace!` events for cache hits
    pub trace_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::Reject,
            inference: InferencePolicy::FirstWins,
            include_inherited_members: true,
            trace_cache: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed TOML or bad field values
    #[error("Invalid reflection config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    reflect: EngineConfig,
}

impl EngineConfig {
    /// Parse the `[reflect]` table of a TOML document; a missing table yields defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(source)?;
        Ok(manifest.reflect)
    }
}
