//! vpnbench -- VPN endpoint throughput benchmarking.
//!
//! This crate drives two external command-line tools (a VPN control
//! utility and the Ookla speedtest CLI), aggregates repeated measurements
//! per VPN location, and persists the results to an append-only JSON
//! report.

pub mod config;
pub mod report;
pub mod system;
pub mod throughput;
pub mod vpn;

use std::path::Path;

use anyhow::Result;
use tracing::{error, warn};

use config::{BenchConfig, InputPlan};
use report::{aggregate, ResultStore};
use throughput::batch::{self, BatchContext, RunMode};
use throughput::ookla::OoklaClient;
use vpn::lifecycle::format_duration;
use vpn::VpnClient;

/// Run the full benchmark: one baseline batch without VPN, then one batch
/// per resolvable location in the plan. Locations are processed strictly
/// one after another; only measurements within a batch run concurrently.
pub async fn run_benchmark(
    config: &BenchConfig,
    plan: &InputPlan,
    mode: RunMode,
    repeat: usize,
    output: &Path,
) -> Result<()> {
    let vpn = VpnClient::new(&config.vpn);
    let ookla = OoklaClient::new(&config.speedtest);

    // Reference measurement with no tunnel active.
    let baseline_samples = batch::run_batch(&ookla, &BatchContext::Baseline, repeat, mode).await;
    let baseline = aggregate::baseline_line(&baseline_samples).unwrap_or_default();

    let store = ResultStore::new(output, baseline);

    for location in &plan.locations {
        let Some(region) = vpn.resolve(location).await else {
            warn!(location = %location, "skipping: no matching region found");
            continue;
        };

        println!("Connecting to VPN: {location}...");
        let elapsed = match vpn.connect(&region).await {
            Ok(elapsed) => elapsed,
            Err(e) => {
                error!(%region, "failed to connect to VPN: {e}");
                continue;
            }
        };
        let time_to_connect = format_duration(elapsed);
        println!("Connected in {time_to_connect}");

        let context = BatchContext::Vpn { time_to_connect };
        let samples = batch::run_batch(&ookla, &context, repeat, mode).await;

        if let Some(stat) = aggregate::aggregate(&samples, &context, mode) {
            store.append(&stat);
        }

        if let Err(e) = vpn.disconnect().await {
            warn!(%region, "failed to disconnect VPN: {e}");
        }
    }

    Ok(())
}
