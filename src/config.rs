//! Configuration: optional TOML file with compiled-in defaults, plus the
//! benchmark input plan (the locations document supplied by the user).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Root configuration for a benchmark run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub vpn: VpnConfig,
    #[serde(default)]
    pub speedtest: SpeedtestConfig,
}

impl BenchConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `VPNBENCH_CONFIG` environment variable.
    /// 2. `vpnbench.toml` in the working directory.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("VPNBENCH_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "VPNBENCH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local_path = Path::new("vpnbench.toml");
        if local_path.exists() {
            match Self::load(local_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local_path.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

/// Configuration for the external VPN control binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnConfig {
    /// Path (or bare command name resolved via `$PATH`) to the VPN control binary.
    pub path: String,
    /// Interval between connection-state polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up waiting for `Connected` after this many seconds. 0 waits forever.
    pub connect_timeout_sec: u64,
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            path: "expressvpnctl".to_string(),
            poll_interval_ms: 500,
            connect_timeout_sec: 120,
        }
    }
}

impl VpnConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_deadline(&self) -> Option<Duration> {
        (self.connect_timeout_sec > 0).then(|| Duration::from_secs(self.connect_timeout_sec))
    }
}

/// Configuration for the external speed-measurement binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedtestConfig {
    /// Path (or bare command name resolved via `$PATH`) to the Ookla speedtest CLI.
    pub path: String,
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            path: "speedtest".to_string(),
        }
    }
}

/// The benchmark input document: which locations to test.
#[derive(Debug, Clone, Deserialize)]
pub struct InputPlan {
    pub locations: Vec<Location>,
}

impl InputPlan {
    /// Load and parse the input document. Errors here are fatal to the run.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
        let plan: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse input file: {}", path.display()))?;
        Ok(plan)
    }
}

/// One benchmark target as supplied by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{}, {}", self.country, city),
            None => write!(f, "{}", self.country),
        }
    }
}
