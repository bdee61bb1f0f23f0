//! In-process riskd server for integration tests.

use std::time::Duration;

use riskd_core::Channel;
use riskd_server::{BoundAddrs, RiskClient, RiskServer, ServerConfig};
use riskd_state::{SharedRiskState, Thresholds};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// A running server plus a handle on its store.
pub struct TestServer {
    addrs: BoundAddrs,
    store: SharedRiskState,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start with thresholds (buy=20, sell=15) and default settings.
    pub async fn start() -> Self {
        Self::start_with(20, 15, ServerConfig::ephemeral()).await
    }

    pub async fn start_with(max_buy: u64, max_sell: u64, config: ServerConfig) -> Self {
        let store = SharedRiskState::new(Thresholds::new(max_buy, max_sell).unwrap());
        let server = RiskServer::bind(config, store.clone()).await.unwrap();
        let addrs = server.local_addrs().unwrap();
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            server.run(token).await.unwrap();
        });

        Self {
            addrs,
            store,
            shutdown,
            handle,
        }
    }

    pub fn store(&self) -> &SharedRiskState {
        &self.store
    }

    pub async fn order_client(&self) -> RiskClient {
        RiskClient::connect(self.addrs.order, Channel::Order)
            .await
            .unwrap()
    }

    pub async fn trade_client(&self) -> RiskClient {
        RiskClient::connect(self.addrs.trade, Channel::Trade)
            .await
            .unwrap()
    }

    /// Poll `check` against the store until it holds or two seconds pass.
    pub async fn wait_for(&self, check: impl Fn(&SharedRiskState) -> bool) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if check(&self.store) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(2), self.handle).await;
    }
}
