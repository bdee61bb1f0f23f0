//! Process wiring.

use riskd_server::{run_metrics_server, RiskServer};
use riskd_state::{SharedRiskState, Thresholds};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::AppResult;

/// The running risk server process.
pub struct Application {
    config: AppConfig,
    store: SharedRiskState,
    shutdown: CancellationToken,
}

impl Application {
    /// Fails if either limit is zero.
    pub fn new(
        config: AppConfig,
        max_buy_position: u64,
        max_sell_position: u64,
    ) -> AppResult<Self> {
        let thresholds = Thresholds::new(max_buy_position, max_sell_position)?;
        Ok(Self {
            config,
            store: SharedRiskState::new(thresholds),
            shutdown: CancellationToken::new(),
        })
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind listeners and serve until Ctrl-C or the shutdown token fires.
    ///
    /// A bind failure on either channel is returned before anything is
    /// served.
    pub async fn run(self) -> AppResult<()> {
        let thresholds = self.store.thresholds();
        let server = RiskServer::bind(self.config.server.clone(), self.store.clone()).await?;
        info!(
            max_buy = thresholds.max_buy(),
            max_sell = thresholds.max_sell(),
            "Risk server bound"
        );

        if self.config.metrics.enabled {
            let metrics = self.config.metrics.clone();
            let store = self.store.clone();
            let token = self.shutdown.child_token();
            tokio::spawn(async move {
                if let Err(e) = run_metrics_server(metrics, store, token).await {
                    error!(error = %e, "Metrics server failed");
                }
            });
        }

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
        });

        server.run(self.shutdown.clone()).await?;

        let open_orders = self.store.open_order_count();
        let instruments = self.store.instrument_count();
        info!(instruments, open_orders, "Risk server stopped");
        Ok(())
    }
}
