//! riskd entry point.

use anyhow::Result;
use clap::Parser;
use riskd::{AppConfig, Application};
use riskd_server::SessionPolicy;
use tracing::info;

/// Pre-trade position risk server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maximum hypothetical worst buy position per instrument
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    max_buy_position: u64,

    /// Maximum hypothetical worst sell position per instrument
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    max_sell_position: u64,

    /// Configuration file path (can also be set via RISKD_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Order channel port
    #[arg(long)]
    order_port: Option<u16>,

    /// Trade channel port
    #[arg(long)]
    trade_port: Option<u16>,

    /// Clear all state whenever a client connects after the first
    #[arg(long)]
    reset_on_reconnect: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.order_port {
            config.server.order_port = port;
        }
        if let Some(port) = self.trade_port {
            config.server.trade_port = port;
        }
        if self.reset_on_reconnect {
            config.server.session_policy = SessionPolicy::ResetOnNewConnection;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    riskd_telemetry::init_logging()?;

    info!("Starting riskd v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    info!(
        order_port = config.server.order_port,
        trade_port = config.server.trade_port,
        session_policy = ?config.server.session_policy,
        "Configuration loaded"
    );

    Application::new(config, args.max_buy_position, args.max_sell_position)?
        .run()
        .await?;

    Ok(())
}
