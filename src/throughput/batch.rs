//! Batch execution of repeated measurements, strictly serial or fanned out
//! across a pool of concurrent invocations.

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::warn;

use super::ookla::{OoklaClient, SpeedSample};

/// How the measurements inside one batch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Parallel,
    Series,
}

impl RunMode {
    /// The report's `Mode` field wording.
    pub fn describe(self) -> &'static str {
        match self {
            RunMode::Parallel => "Tests ran in parallel",
            RunMode::Series => "Tests ran in series (one after another)",
        }
    }
}

/// Whether a batch runs against the bare uplink or through a VPN tunnel.
#[derive(Debug, Clone)]
pub enum BatchContext {
    Baseline,
    Vpn { time_to_connect: String },
}

impl BatchContext {
    pub fn is_baseline(&self) -> bool {
        matches!(self, BatchContext::Baseline)
    }

    fn describe(&self) -> &'static str {
        if self.is_baseline() {
            "without VPN"
        } else {
            "through VPN"
        }
    }
}

/// Run `count` measurements and collect every sample that completed.
///
/// Series mode stops at the first failure. Parallel mode launches all
/// `count` invocations at once; a failure there only costs its own sample.
/// Either way the batch returns only after every launched invocation has
/// terminated.
pub async fn run_batch(
    client: &OoklaClient,
    context: &BatchContext,
    count: usize,
    mode: RunMode,
) -> Vec<SpeedSample> {
    if count == 0 {
        return Vec::new();
    }
    match mode {
        RunMode::Series => run_series(client, context, count).await,
        RunMode::Parallel => run_parallel(client, context, count).await,
    }
}

async fn run_series(client: &OoklaClient, context: &BatchContext, count: usize) -> Vec<SpeedSample> {
    let mut samples = Vec::with_capacity(count);
    for n in 1..=count {
        println!("Running speed test #{n} {}...", context.describe());
        match client.run_once().await {
            Ok(sample) => {
                print_sample(&sample);
                samples.push(sample);
            }
            Err(e) => {
                warn!(test = n, error = %e, "speed test failed, aborting batch");
                break;
            }
        }
    }
    samples
}

async fn run_parallel(
    client: &OoklaClient,
    context: &BatchContext,
    count: usize,
) -> Vec<SpeedSample> {
    println!("Running speed tests {}...", context.describe());

    // Fan-in channel sized to the pool so no sender ever blocks.
    let (tx, mut rx) = mpsc::channel(count);
    let mut pool = JoinSet::new();

    for n in 1..=count {
        let client = client.clone();
        let tx = tx.clone();
        pool.spawn(async move {
            match client.run_once().await {
                Ok(sample) => {
                    print_sample(&sample);
                    let _ = tx.send(sample).await;
                }
                Err(e) => warn!(test = n, error = %e, "speed test failed"),
            }
        });
    }
    drop(tx);

    // The batch is complete only once every invocation has terminated and
    // the channel has been drained.
    while pool.join_next().await.is_some() {}

    let mut samples = Vec::with_capacity(count);
    while let Some(sample) = rx.recv().await {
        samples.push(sample);
    }
    samples
}

/// Console lines for one completed measurement.
fn print_sample(sample: &SpeedSample) {
    println!();
    println!("Location: {}", sample.server_location());
    println!("Server: {}", sample.server.host);
    println!("Ping Latency: {:.2} ms", sample.ping.latency);
    println!("Download Bandwidth: {}Mbps", sample.download_mbps());
    println!("Upload Bandwidth: {}Mbps", sample.upload_mbps());
}
