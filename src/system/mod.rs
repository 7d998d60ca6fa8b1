//! Machine identity: hostname and OS version detection.

use std::process::Command;

use anyhow::{Context, Result};

/// The local machine's hostname, for the report header.
pub fn machine_name() -> Result<String> {
    let name = hostname::get().context("failed to read hostname")?;
    Ok(name.to_string_lossy().into_owned())
}

/// `"<os>: <version>"` for the report header, e.g. `"linux: Ubuntu 24.04 LTS"`.
pub fn os_description() -> String {
    format!("{}: {}", std::env::consts::OS, os_version())
}

/// Human-readable OS version, probed with the platform's own tooling.
/// Falls back to a placeholder when nothing answers.
pub fn os_version() -> String {
    if cfg!(target_os = "linux") {
        if let Ok(out) = Command::new("lsb_release").arg("-d").output() {
            let s = String::from_utf8_lossy(&out.stdout);
            // format: Description:	Ubuntu 24.04 LTS
            if let Some((_, description)) = s.split_once(':') {
                let description = description.trim();
                if !description.is_empty() {
                    return description.to_string();
                }
            }
        }
    } else if cfg!(target_os = "macos") {
        if let Ok(out) = Command::new("sw_vers").arg("-productVersion").output() {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !version.is_empty() {
                return format!("macOS {version}");
            }
        }
    } else if cfg!(target_os = "windows") {
        if let Ok(out) = Command::new("cmd").args(["/C", "ver"]).output() {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !version.is_empty() {
                return version;
            }
        }
    }

    "Unknown OS".to_string()
}
