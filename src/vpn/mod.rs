//! VPN control-tool integration: region listing, resolution, and the
//! connect/disconnect lifecycle.

pub mod lifecycle;
pub mod resolver;

use thiserror::Error;

use crate::config::VpnConfig;
use lifecycle::RetryPolicy;

#[derive(Debug, Error)]
pub enum VpnError {
    #[error("could not invoke vpn control tool at {path}: {source}")]
    NotInvokable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("vpn control tool exited with code {code}: {stderr}")]
    ControlFailed { code: i32, stderr: String },

    #[error("connection not ready after {waited_ms}ms")]
    ConnectDeadline { waited_ms: u128 },
}

/// Thin client over the external VPN control binary.
///
/// Every operation is a subprocess invocation; the tool's stdout is the
/// only channel for state.
#[derive(Debug, Clone)]
pub struct VpnClient {
    path: String,
    policy: RetryPolicy,
}

impl VpnClient {
    pub fn new(config: &VpnConfig) -> Self {
        Self {
            path: config.path.clone(),
            policy: RetryPolicy {
                interval: config.poll_interval(),
                deadline: config.connect_deadline(),
            },
        }
    }

    /// Check if the control binary can be executed at all.
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.path)
            .arg("--version")
            .output()
            .is_ok()
    }

    /// Fetch the provider's available region tokens, one per stdout line.
    pub async fn regions(&self) -> Result<Vec<String>, VpnError> {
        let stdout = self.run_control_stdout(&["get", "regions"]).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Run a control command for its side effect, mapping a nonzero exit
    /// into an error.
    async fn run_control(&self, args: &[&str]) -> Result<(), VpnError> {
        self.run_control_stdout(args).await.map(|_| ())
    }

    async fn run_control_stdout(&self, args: &[&str]) -> Result<String, VpnError> {
        let output = tokio::process::Command::new(&self.path)
            .args(args)
            .output()
            .await
            .map_err(|e| VpnError::NotInvokable {
                path: self.path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(VpnError::ControlFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
