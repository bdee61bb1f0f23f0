//! Demo client: replays a short order/trade session against a running riskd.
//!
//! With thresholds (20, 15) the expected outcome is accepted, trade applied,
//! rejected.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use riskd_core::{Channel, InstrumentId, OrderId, Side, TradeId};
use riskd_server::RiskClient;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Send a demo order session to riskd")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 55555)]
    order_port: u16,

    #[arg(long, default_value_t = 55556)]
    trade_port: u16,

    /// Seconds to wait for each order response
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    riskd_telemetry::init_logging()?;
    let timeout = Duration::from_secs(args.timeout_secs);

    let mut orders =
        RiskClient::connect((args.host.as_str(), args.order_port), Channel::Order).await?;
    let mut trades =
        RiskClient::connect((args.host.as_str(), args.trade_port), Channel::Trade).await?;

    orders
        .send_new_order(InstrumentId(1), OrderId(1), 10, 100, Side::Buy)
        .await?;
    let response = orders.recv_response(timeout).await?;
    info!(order_id = %response.order_id, status = %response.status, "New order (buy 10)");

    trades
        .send_trade(InstrumentId(1), TradeId(1), 5, 100)
        .await?;
    info!(instrument_id = 1, quantity = 5, "Trade sent");

    orders
        .send_new_order(InstrumentId(2), OrderId(2), 30, 100, Side::Buy)
        .await?;
    let response = orders.recv_response(timeout).await?;
    info!(order_id = %response.order_id, status = %response.status, "New order (buy 30)");

    Ok(())
}
