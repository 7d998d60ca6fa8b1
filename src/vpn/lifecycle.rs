//! Connect/disconnect sequencing and the connection-state poll loop.
//!
//! A connect attempt moves through: command issued, repeated state polls,
//! then either `Connected` or failure (command error, or deadline expiry
//! when a deadline is configured).

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::{VpnClient, VpnError};

/// The literal state string the control tool reports once the tunnel is up.
const CONNECTED_STATE: &str = "Connected";

/// How often to poll the connection state, and for how long before giving up.
/// `deadline: None` waits forever, matching the provider tool's own behavior.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Some(Duration::from_secs(120)),
        }
    }
}

impl VpnClient {
    /// Connect to `region` and block until the tool reports `Connected`.
    ///
    /// Returns the elapsed time from issuing the connect command to the
    /// first `Connected` observation, rounded to millisecond precision.
    /// A failing connect command short-circuits; the poll loop is never
    /// entered.
    pub async fn connect(&self, region: &str) -> Result<Duration, VpnError> {
        let start = Instant::now();
        self.run_control(&["connect", region]).await?;
        self.wait_for_connection(start).await?;
        Ok(round_to_millis(start.elapsed()))
    }

    /// Issue the disconnect command once; no confirmation poll.
    pub async fn disconnect(&self) -> Result<(), VpnError> {
        self.run_control(&["disconnect"]).await
    }

    async fn wait_for_connection(&self, started: Instant) -> Result<(), VpnError> {
        loop {
            match self.run_control_stdout(&["get", "connectionstate"]).await {
                Ok(state) if state.trim() == CONNECTED_STATE => return Ok(()),
                Ok(state) => debug!(state = %state.trim(), "connection not ready"),
                Err(e) => debug!(error = %e, "connection state query failed"),
            }

            if let Some(deadline) = self.policy.deadline {
                if started.elapsed() >= deadline {
                    return Err(VpnError::ConnectDeadline {
                        waited_ms: started.elapsed().as_millis(),
                    });
                }
            }

            sleep(self.policy.interval).await;
        }
    }
}

fn round_to_millis(d: Duration) -> Duration {
    Duration::from_millis((d.as_secs_f64() * 1000.0).round() as u64)
}

/// Render an elapsed duration the way the report expects: `742ms`,
/// `2.345s`, `1m2.345s`.
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) as f64 / 1000.0;
    let seconds = trim_fraction(seconds);
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m{seconds}s")
    }
}

fn trim_fraction(seconds: f64) -> String {
    let s = format!("{seconds:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
