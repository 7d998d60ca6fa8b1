//! Reduces one batch of measurement samples into a single averaged stat.

use chrono::Local;

use super::VpnStat;
use crate::throughput::batch::{BatchContext, RunMode};
use crate::throughput::ookla::SpeedSample;

/// Average a batch into one stat row.
///
/// Download/upload are arithmetic means over the whole batch, formatted to
/// two decimals. Descriptive fields come from the last sample in iteration
/// order; samples within a batch are expected, but not verified, to share
/// one server. An empty batch produces nothing to persist, and a baseline
/// batch never becomes a stat row (it feeds [`baseline_line`] instead).
pub fn aggregate(samples: &[SpeedSample], context: &BatchContext, mode: RunMode) -> Option<VpnStat> {
    let BatchContext::Vpn { time_to_connect } = context else {
        return None;
    };
    let last = samples.last()?;
    let count = samples.len() as f64;

    let total_download: u64 = samples.iter().map(SpeedSample::download_mbps).sum();
    let total_upload: u64 = samples.iter().map(SpeedSample::upload_mbps).sum();

    Some(VpnStat {
        location_name: last.server_location(),
        time_to_connect: time_to_connect.clone(),
        download_speed: format!("{:.2}Mbps", total_download as f64 / count),
        upload_speed: format!("{:.2}Mbps", total_upload as f64 / count),
        latency: format!("{:.2}ms", last.ping.latency),
        server: last.server.host.clone(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        mode: mode.describe().to_string(),
    })
}

/// Render the no-VPN reference line from a baseline batch, taken from the
/// last completed sample. `None` when the batch produced no samples.
pub fn baseline_line(samples: &[SpeedSample]) -> Option<String> {
    let last = samples.last()?;
    Some(format!(
        "{}Mbps ▼  {}Mbps ▲",
        last.download_mbps(),
        last.upload_mbps()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throughput::ookla::{Ping, Server, Transfer};
    use crate::throughput::BANDWIDTH_UNITS_PER_MBPS;

    fn sample(download_mbps: u64, upload_mbps: u64, host: &str) -> SpeedSample {
        SpeedSample {
            ping: Ping { latency: 12.34 },
            download: Transfer {
                bandwidth: download_mbps * BANDWIDTH_UNITS_PER_MBPS,
            },
            upload: Transfer {
                bandwidth: upload_mbps * BANDWIDTH_UNITS_PER_MBPS,
            },
            server: Server {
                host: host.to_string(),
                name: "Example".to_string(),
                country: "Netherlands".to_string(),
                location: "Amsterdam".to_string(),
            },
        }
    }

    fn vpn_context(time_to_connect: &str) -> BatchContext {
        BatchContext::Vpn {
            time_to_connect: time_to_connect.to_string(),
        }
    }

    #[test]
    fn test_mean_of_three_samples() {
        let samples = vec![
            sample(100, 50, "a.example.net"),
            sample(200, 60, "b.example.net"),
            sample(300, 70, "c.example.net"),
        ];

        let stat = aggregate(&samples, &vpn_context("1.5s"), RunMode::Parallel).unwrap();
        assert_eq!(stat.download_speed, "200.00Mbps");
        assert_eq!(stat.upload_speed, "60.00Mbps");
    }

    #[test]
    fn test_mean_keeps_fractional_part() {
        let samples = vec![sample(100, 10, "a"), sample(101, 11, "b")];
        let stat = aggregate(&samples, &vpn_context(""), RunMode::Series).unwrap();
        assert_eq!(stat.download_speed, "100.50Mbps");
        assert_eq!(stat.upload_speed, "10.50Mbps");
    }

    #[test]
    fn test_descriptive_fields_come_from_last_sample() {
        let samples = vec![
            sample(100, 50, "first.example.net"),
            sample(200, 60, "last.example.net"),
        ];

        let stat = aggregate(&samples, &vpn_context("2.345s"), RunMode::Series).unwrap();
        assert_eq!(stat.server, "last.example.net");
        assert_eq!(stat.location_name, "Netherlands, Amsterdam");
        assert_eq!(stat.latency, "12.34ms");
        assert_eq!(stat.time_to_connect, "2.345s");
        assert_eq!(stat.mode, "Tests ran in series (one after another)");
        assert!(!stat.timestamp.is_empty());
    }

    #[test]
    fn test_empty_batch_yields_no_stat() {
        assert!(aggregate(&[], &vpn_context("1s"), RunMode::Parallel).is_none());
    }

    #[test]
    fn test_baseline_batch_yields_no_stat() {
        let samples = vec![sample(100, 50, "a")];
        assert!(aggregate(&samples, &BatchContext::Baseline, RunMode::Parallel).is_none());
    }

    #[test]
    fn test_baseline_line_from_last_sample() {
        let samples = vec![sample(500, 80, "a"), sample(100, 41, "b")];
        assert_eq!(baseline_line(&samples).as_deref(), Some("100Mbps ▼  41Mbps ▲"));
    }

    #[test]
    fn test_baseline_line_empty_batch() {
        assert_eq!(baseline_line(&[]), None);
    }
}
