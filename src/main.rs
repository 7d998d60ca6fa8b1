use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use vpnbench::config::{BenchConfig, InputPlan};
use vpnbench::throughput::batch::RunMode;
use vpnbench::throughput::ookla::OoklaClient;
use vpnbench::vpn::VpnClient;

#[derive(Parser)]
#[command(
    name = "vpnbench",
    about = "Benchmark network throughput across VPN endpoints",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark over every location in the input file
    Run {
        /// Input JSON file listing the locations to test
        input: PathBuf,

        /// Run speed tests in series, one after another, in case of 1Gbps network
        #[arg(long, short = 's')]
        series: bool,

        /// Number of speed tests per VPN connection
        #[arg(long, short = 'r', default_value = "5")]
        repeat: usize,

        /// Results file path (default: results-<timestamp>.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the provider regions available to connect to
    Regions,

    /// Check that the external tools are installed
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BenchConfig::load_or_default();

    match cli.command {
        Commands::Run {
            input,
            series,
            repeat,
            output,
        } => {
            if repeat == 0 {
                anyhow::bail!("number of speed tests must be at least 1");
            }

            let mode = if series {
                RunMode::Series
            } else {
                RunMode::Parallel
            };

            if repeat == 1 {
                println!("Running a single speed test per VPN connection");
            } else if mode == RunMode::Series {
                println!("Running {repeat} speed tests in series");
            } else {
                println!("Running speed tests with {repeat} parallel tests");
            }

            let plan = InputPlan::load(&input)?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "results-{}.json",
                    chrono::Local::now().format("%Y%m%d%H%M%S")
                ))
            });

            tracing::info!(output = %output.display(), "starting benchmark");
            vpnbench::run_benchmark(&config, &plan, mode, repeat, &output).await?;
        }
        Commands::Regions => {
            let vpn = VpnClient::new(&config.vpn);
            for region in vpn.regions().await? {
                println!("{region}");
            }
        }
        Commands::Doctor => {
            let vpn = VpnClient::new(&config.vpn);
            let ookla = OoklaClient::new(&config.speedtest);

            let checks = [
                (config.vpn.path.as_str(), vpn.is_available()),
                (config.speedtest.path.as_str(), ookla.is_available()),
            ];

            let mut all_found = true;
            for (tool, found) in checks {
                println!("{:<16} {}", tool, if found { "FOUND" } else { "MISSING" });
                all_found &= found;
            }

            if !all_found {
                anyhow::bail!("one or more external tools are missing");
            }
        }
    }

    Ok(())
}
