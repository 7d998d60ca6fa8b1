//! Speed measurement engine: Ookla CLI wrapper and batch execution.

pub mod batch;
pub mod ookla;

use thiserror::Error;

/// The Ookla CLI reports bandwidth in units where dividing by this
/// constant yields Mbps. The report format depends on this exact value.
pub const BANDWIDTH_UNITS_PER_MBPS: u64 = 125_000;

#[derive(Debug, Error)]
pub enum SpeedTestError {
    #[error("could not invoke speedtest at {path}: {source}")]
    NotInvokable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("speedtest exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("speedtest output was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}
