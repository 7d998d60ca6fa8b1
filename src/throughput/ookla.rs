//! Ookla speedtest CLI wrapper -- spawn, parse JSON output.

use serde::Deserialize;

use super::{SpeedTestError, BANDWIDTH_UNITS_PER_MBPS};
use crate::config::SpeedtestConfig;

/// Parsed speedtest JSON result (subset of fields we care about).
#[derive(Debug, Clone, Deserialize)]
pub struct SpeedSample {
    pub ping: Ping,
    pub download: Transfer,
    pub upload: Transfer,
    pub server: Server,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ping {
    pub latency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transfer {
    pub bandwidth: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub name: String,
    pub country: String,
    pub location: String,
}

impl SpeedSample {
    /// Download speed in whole Mbps, matching the CLI's own summary rendering.
    pub fn download_mbps(&self) -> u64 {
        self.download.bandwidth / BANDWIDTH_UNITS_PER_MBPS
    }

    /// Upload speed in whole Mbps.
    pub fn upload_mbps(&self) -> u64 {
        self.upload.bandwidth / BANDWIDTH_UNITS_PER_MBPS
    }

    /// "Country, City" as reported by the measurement server.
    pub fn server_location(&self) -> String {
        format!("{}, {}", self.server.country, self.server.location)
    }
}

/// Parse a speedtest JSON document into a sample.
pub fn parse_output(json: &str) -> Result<SpeedSample, serde_json::Error> {
    serde_json::from_str(json)
}

/// Client for the Ookla speedtest CLI.
#[derive(Debug, Clone)]
pub struct OoklaClient {
    path: String,
}

impl OoklaClient {
    pub fn new(config: &SpeedtestConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    /// Check if the CLI can be executed at all.
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.path)
            .arg("--version")
            .output()
            .is_ok()
    }

    /// Run one measurement to completion and parse its output.
    pub async fn run_once(&self) -> Result<SpeedSample, SpeedTestError> {
        let output = tokio::process::Command::new(&self.path)
            .args(["-f", "json-pretty"])
            .output()
            .await
            .map_err(|e| SpeedTestError::NotInvokable {
                path: self.path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(SpeedTestError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout))?)
    }
}
