//! Runner configuration, read from TOML with environment-backed defaults.
//!
//! Every section is optional:
//!
//! ```toml
//! seed = 7
//!
//! [simulation]
//! jury_size = 6
//! detail_level = "detailed"
//!
//! [pacing]
//! action_delay_ms = 250
//!
//! [objections]
//! probability = 0.3
//!
//! [jurisdiction]
//! system = "louisiana"
//!
//! [[backends]]
//! name = "local"
//! url = "http://localhost:11434"
//! model = "llama2"
//! max_concurrent = 2
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendPool, BackendResult, OllamaBackend};
use crate::case::LegalSystem;
use crate::engine::{Pacing, SimulationSettings};
use crate::objection::ObjectionPolicy;
use crate::verdict::VerdictCalculator;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Base delays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub action_delay_ms: u64,
    pub deliberation_time_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            action_delay_ms: 1000,
            deliberation_time_ms: 3000,
        }
    }
}

impl From<PacingConfig> for Pacing {
    fn from(c: PacingConfig) -> Self {
        Pacing {
            action_delay: Duration::from_millis(c.action_delay_ms),
            deliberation_time: Duration::from_millis(c.deliberation_time_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JurisdictionConfig {
    pub system: LegalSystem,
}

/// One model endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,
    pub model: String,
    /// Concurrent requests this instance accepts
    pub max_concurrent: usize,
    /// Token budget per statement
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            url: std::env::var("COURTROOM_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into()),
            model: std::env::var("COURTROOM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            max_concurrent: 4,
            max_tokens: 300,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            timeout_secs: 5,
        }
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Bound on a single backend health check.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Top-level runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtroomConfig {
    pub simulation: SimulationSettings,
    pub pacing: PacingConfig,
    pub objections: ObjectionPolicy,
    pub verdict: VerdictCalculator,
    pub jurisdiction: JurisdictionConfig,
    pub backends: Vec<BackendConfig>,
    pub health: HealthConfig,
    /// Fixed seed for a reproducible run
    pub seed: Option<u64>,
}

impl Default for CourtroomConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            pacing: PacingConfig::default(),
            objections: ObjectionPolicy::default(),
            verdict: VerdictCalculator::default(),
            jurisdiction: JurisdictionConfig::default(),
            backends: vec![BackendConfig::default()],
            health: HealthConfig::default(),
            seed: std::env::var("COURTROOM_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

impl CourtroomConfig {
    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), backends = config.backends.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can use. An out-of-range jury size is allowed;
    /// the engine skips jury phases for it.
    pub fn validate(&self) -> ConfigResult<()> {
        let p = self.objections.probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "objections.probability must be within 0..=1, got {p}"
            )));
        }
        if !self.simulation.realtime_speed.is_finite() || self.simulation.realtime_speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "simulation.realtime_speed must be a non-negative number, got {}",
                self.simulation.realtime_speed
            )));
        }
        if !self.verdict.threshold.is_finite() || !self.verdict.jitter.is_finite() {
            return Err(ConfigError::Invalid(
                "verdict.threshold and verdict.jitter must be finite".into(),
            ));
        }
        for backend in &self.backends {
            if backend.max_concurrent == 0 {
                return Err(ConfigError::Invalid(format!(
                    "backend '{}' has max_concurrent = 0",
                    backend.name
                )));
            }
            if backend.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "backend '{}' has an empty url",
                    backend.name
                )));
            }
        }
        Ok(())
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing.into()
    }

    /// Token budget for persona agents: the smallest any backend allows.
    pub fn max_tokens(&self) -> u32 {
        self.backends
            .iter()
            .map(|b| b.max_tokens)
            .min()
            .unwrap_or(300)
    }

    /// One pool instance per configured backend.
    pub fn backend_pool(&self) -> BackendResult<BackendPool> {
        let mut pool = BackendPool::new().with_check_timeout(self.health.timeout());
        for b in &self.backends {
            let backend = OllamaBackend::with_timeout(
                &b.name,
                &b.url,
                &b.model,
                Duration::from_secs(b.timeout_secs.max(1)),
            )?;
            pool.add(Arc::new(backend), b.max_concurrent);
        }
        Ok(pool)
    }
}
