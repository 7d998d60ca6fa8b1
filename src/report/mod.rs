//! Durable results document: load/save plus the mutex-guarded append store.

pub mod aggregate;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::system;

/// One persisted row of the report. Immutable once written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpnStat {
    #[serde(rename = "LocationName")]
    pub location_name: String,
    #[serde(rename = "TimeToConnect")]
    pub time_to_connect: String,
    #[serde(rename = "VPNDownloadSpeed")]
    pub download_speed: String,
    #[serde(rename = "VPNUploadSpeed")]
    pub upload_speed: String,
    #[serde(rename = "VPNLatency")]
    pub latency: String,
    #[serde(rename = "Server")]
    pub server: String,
    #[serde(rename = "Date/Time")]
    pub timestamp: String,
    #[serde(rename = "Mode")]
    pub mode: String,
}

/// The whole on-disk report document, append-only across one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(rename = "MachineName")]
    pub machine_name: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "WithoutVPN")]
    pub without_vpn: String,
    #[serde(rename = "VPNStats")]
    pub stats: Vec<VpnStat>,
}

/// Load a results document. A missing file is an empty document, not an
/// error; a malformed file is an error.
pub fn load_from_file(path: &Path) -> Result<Results> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Results::default()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read results file: {}", path.display()))
        }
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse results file: {}", path.display()))
}

/// Persist the document pretty-printed. The write goes to a sibling temp
/// file and renames over the target, so a concurrent reader never observes
/// a partial document.
pub fn save_to_file(results: &Results, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write results file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace results file: {}", path.display()))?;
    Ok(())
}

/// Append-only store over one results file.
///
/// Machine identity and the no-VPN baseline are filled in on the first
/// successful append and never touched again for the lifetime of the store.
pub struct ResultStore {
    path: PathBuf,
    baseline: String,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    identity_written: bool,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>, baseline: String) -> Self {
        Self {
            path: path.into(),
            baseline,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one stat under the store lock, held for the whole
    /// read-modify-write cycle. Failures are logged and cost only the
    /// triggering stat; they never abort the run.
    pub fn append(&self, stat: &VpnStat) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut results = match load_from_file(&self.path) {
            Ok(results) => results,
            Err(e) => {
                error!("error loading results file: {e:#}");
                return;
            }
        };

        if !state.identity_written && results.machine_name.is_empty() {
            let machine_name = match system::machine_name() {
                Ok(name) => name,
                Err(e) => {
                    error!("error getting hostname: {e:#}");
                    return;
                }
            };
            results.machine_name = machine_name;
            results.os = system::os_description();
            results.without_vpn = self.baseline.clone();
        }

        results.stats.push(stat.clone());

        match save_to_file(&results, &self.path) {
            Ok(()) => state.identity_written = true,
            Err(e) => error!("error saving results file: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stat(server: &str) -> VpnStat {
        VpnStat {
            location_name: "Netherlands, Amsterdam".to_string(),
            time_to_connect: "2.345s".to_string(),
            download_speed: "100.00Mbps".to_string(),
            upload_speed: "41.00Mbps".to_string(),
            latency: "12.34ms".to_string(),
            server: server.to_string(),
            timestamp: "2026-03-14 10:01:02".to_string(),
            mode: "Tests ran in parallel".to_string(),
        }
    }

    #[test]
    fn test_load_nonexistent_is_empty_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let results = load_from_file(&dir.path().join("missing.json")).unwrap();
        assert_eq!(results, Results::default());
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ broken").unwrap();
        assert!(load_from_file(&path).is_err());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let results = Results {
            machine_name: "bench-host".to_string(),
            os: "linux: Ubuntu 24.04".to_string(),
            without_vpn: "100Mbps ▼  41Mbps ▲".to_string(),
            stats: vec![sample_stat("speedtest.ams1.example.net")],
        };

        save_to_file(&results, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded, results);
    }

    #[test]
    fn test_serialized_field_names() {
        let results = Results {
            stats: vec![sample_stat("host")],
            ..Results::default()
        };
        let json = serde_json::to_string_pretty(&results).unwrap();
        for field in [
            "MachineName",
            "OS",
            "WithoutVPN",
            "VPNStats",
            "LocationName",
            "TimeToConnect",
            "VPNDownloadSpeed",
            "VPNUploadSpeed",
            "VPNLatency",
            "Server",
            "Date/Time",
            "Mode",
        ] {
            assert!(json.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }

    #[test]
    fn test_append_populates_identity_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let store = ResultStore::new(&path, "100Mbps ▼  41Mbps ▲".to_string());

        store.append(&sample_stat("first.example.net"));
        let after_first = load_from_file(&path).unwrap();
        assert!(!after_first.machine_name.is_empty());
        assert_eq!(after_first.without_vpn, "100Mbps ▼  41Mbps ▲");
        assert_eq!(after_first.stats.len(), 1);

        store.append(&sample_stat("second.example.net"));
        let after_second = load_from_file(&path).unwrap();
        assert_eq!(after_second.machine_name, after_first.machine_name);
        assert_eq!(after_second.os, after_first.os);
        assert_eq!(after_second.without_vpn, after_first.without_vpn);
        assert_eq!(after_second.stats.len(), 2);
        assert_eq!(after_second.stats[0].server, "first.example.net");
        assert_eq!(after_second.stats[1].server, "second.example.net");
    }

    #[test]
    fn test_append_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let store = ResultStore::new(&path, String::new());

        store.append(&sample_stat("host"));
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
