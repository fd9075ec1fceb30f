mod config;
mod error;
mod frames;
mod radio;
mod run;

use clap::{Parser, Subcommand};
use config::SimConfig;
use mote_relay::DisconnectedWrite;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mote-sim")]
#[command(about = "Drive the mote frame relay against a simulated wifi radio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay against the simulated radio and print a JSON report
    Run {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// How long to run, in milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Delay between received frames, in microseconds
        #[arg(long)]
        rx_interval_us: Option<u64>,

        /// Size of each received frame
        #[arg(long)]
        frame_len: Option<usize>,

        /// Receive queue capacity
        #[arg(long)]
        capacity: Option<usize>,

        /// Consumer read buffer size
        #[arg(long)]
        read_buf: Option<usize>,

        /// Drop the link every N milliseconds
        #[arg(long)]
        flap_every_ms: Option<u64>,

        /// Fail writes instead of attempting them when the link stays down
        #[arg(long)]
        fail_fast: bool,

        /// Do not echo received frames back out
        #[arg(long)]
        no_echo: bool,
    },
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            duration_ms,
            rx_interval_us,
            frame_len,
            capacity,
            read_buf,
            flap_every_ms,
            fail_fast,
            no_echo,
        } => {
            let mut sim = match config {
                Some(path) => SimConfig::load(&path)?,
                None => SimConfig::default(),
            };

            if let Some(v) = duration_ms {
                sim.consumer.duration_ms = v;
            }
            if let Some(v) = rx_interval_us {
                sim.radio.rx_interval_us = v;
            }
            if let Some(v) = frame_len {
                sim.radio.frame_len = v;
            }
            if let Some(v) = capacity {
                sim.relay.capacity = v;
            }
            if let Some(v) = read_buf {
                sim.consumer.read_buf = v;
            }
            if flap_every_ms.is_some() {
                sim.radio.flap_every_ms = flap_every_ms;
            }
            if fail_fast {
                sim.relay.disconnected_write = DisconnectedWrite::FailFast;
            }
            if no_echo {
                sim.consumer.echo = false;
            }

            tracing::info!(
                capacity = sim.relay.capacity,
                duration_ms = sim.consumer.duration_ms,
                station = ?sim.station,
                "Starting simulation"
            );

            let report = run::run(sim).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&SimConfig::default())?);
        }
    }

    Ok(())
}
