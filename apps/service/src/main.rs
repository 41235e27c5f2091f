use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

mod config;
mod drivers;
mod measurements;
mod receiver;
mod service;

use config::Config;
use service::RelayQosService;

/// Relay echo scheduling and external ping measurements for inter-cloud QoS
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the relay echo schedule and the event receiver
    Run,
    /// Measure reachability of an address once through the external ping monitor
    Ping {
        address: String,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_config(cli.config.as_ref())?;
    match config.log_format() {
        Some(format) => logger::init_tracing_with(format),
        None => logger::init_tracing(),
    }
    info!("{}", config);

    let service = RelayQosService::new(config)?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => service.run().await,
        Command::Ping { address } => {
            let summary = service.ping_once(&address).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
