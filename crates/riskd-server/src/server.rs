//! Server orchestrator: two listeners, one shared store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use riskd_core::Channel;
use riskd_state::SharedRiskState;
use riskd_telemetry::Metrics;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, SessionPolicy};
use crate::connection::ConnectionHandler;
use crate::error::{ServerError, ServerResult};
use crate::limiter::ConnectionLimiter;

/// Pause after a failed accept, so persistent errors such as EMFILE do not
/// spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Addresses the listeners actually bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundAddrs {
    pub order: SocketAddr,
    pub trade: SocketAddr,
}

/// Accepts order and trade channel connections and spawns one handler task
/// per connection.
pub struct RiskServer {
    config: ServerConfig,
    store: SharedRiskState,
    order_listener: TcpListener,
    trade_listener: TcpListener,
    limiter: Arc<ConnectionLimiter>,
    accepted: u64,
}

impl RiskServer {
    /// Bind both listeners. Either failing is fatal.
    pub async fn bind(config: ServerConfig, store: SharedRiskState) -> ServerResult<Self> {
        let order_listener = bind_listener(&config, Channel::Order).await?;
        let trade_listener = bind_listener(&config, Channel::Trade).await?;
        let limiter = Arc::new(ConnectionLimiter::new(config.max_connections));

        Ok(Self {
            config,
            store,
            order_listener,
            trade_listener,
            limiter,
            accepted: 0,
        })
    }

    pub fn local_addrs(&self) -> ServerResult<BoundAddrs> {
        Ok(BoundAddrs {
            order: self.order_listener.local_addr()?,
            trade: self.trade_listener.local_addr()?,
        })
    }

    /// Run the accept loop until `shutdown` is cancelled.
    ///
    /// Handlers receive a child token, so cancelling also closes every open
    /// connection.
    pub async fn run(mut self, shutdown: CancellationToken) -> ServerResult<()> {
        if let Ok(addrs) = self.local_addrs() {
            info!(
                order_addr = %addrs.order,
                trade_addr = %addrs.trade,
                session_policy = ?self.config.session_policy,
                max_connections = self.config.max_connections,
                "Risk server accepting connections"
            );
        }

        loop {
            let (accepted, channel) = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping accept loop");
                    break;
                }
                accepted = self.order_listener.accept() => (accepted, Channel::Order),
                accepted = self.trade_listener.accept() => (accepted, Channel::Trade),
            };

            match accepted {
                Ok((stream, peer)) => self.on_accept(stream, peer, channel, &shutdown),
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Accept failed");
                    if !backoff_after_accept_error(&shutdown).await {
                        info!("Shutdown requested, stopping accept loop");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn on_accept(
        &mut self,
        stream: TcpStream,
        peer: SocketAddr,
        channel: Channel,
        shutdown: &CancellationToken,
    ) {
        let Some(guard) = self.limiter.try_acquire() else {
            warn!(
                channel = %channel,
                peer = %peer,
                current = self.limiter.current_count(),
                max = self.limiter.max(),
                "Connection limit reached, refusing client"
            );
            Metrics::connection_refused(channel);
            return;
        };

        self.accepted += 1;
        if self.config.session_policy == SessionPolicy::ResetOnNewConnection && self.accepted > 1 {
            info!(channel = %channel, peer = %peer, "New session, resetting risk state");
            self.store.reset();
            Metrics::state_reset();
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let handler = ConnectionHandler::new(
            channel,
            peer,
            self.store.clone(),
            self.config.read_timeout(),
        )
        .with_max_payload_size(self.config.max_payload_size);
        let token = shutdown.child_token();
        tokio::spawn(async move {
            let _guard = guard;
            handler.run(stream, token).await;
        });
    }
}

/// Sleep for [`ACCEPT_ERROR_BACKOFF`]. Returns `false` if `shutdown` fired
/// first.
async fn backoff_after_accept_error(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => false,
        () = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
    }
}

async fn bind_listener(config: &ServerConfig, channel: Channel) -> ServerResult<TcpListener> {
    let addr = config.listen_addr(channel);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            channel,
            addr: addr.clone(),
            source,
        })?;
    debug!(channel = %channel, addr = %addr, "Listener bound");
    Ok(listener)
}
