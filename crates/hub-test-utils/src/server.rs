//! In-process hub server.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use signaling_hub::actors::HubActorHandle;
use signaling_hub::config::Config;
use signaling_hub::observability::HealthState;
use signaling_hub::routes::{build_routes, AppState};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running hub listening on `127.0.0.1` with an OS-assigned port.
///
/// Metrics are rendered from a recorder that is never installed globally, so
/// any number of servers can run in one test binary.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: HubActorHandle,
    pub health: Arc<HealthState>,
    cancel_token: CancellationToken,
    hub_task: JoinHandle<()>,
    server_task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with default configuration.
    pub async fn start() -> Self {
        Self::start_with_config(Config::default()).await
    }

    /// Start a server with `config`; `bind_address` is ignored.
    pub async fn start_with_config(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("listener has no local address");

        let cancel_token = CancellationToken::new();
        let (hub, hub_task) = HubActorHandle::spawn(
            config.mailbox_buffer,
            config.connection_buffer,
            cancel_token.clone(),
        );

        let health = Arc::new(HealthState::new());
        health.set_ready();

        let state = Arc::new(AppState {
            hub: hub.clone(),
            health: Arc::clone(&health),
            config: Config {
                bind_address: addr,
                ..config
            },
        });
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state, metrics_handle);

        let shutdown = cancel_token.clone();
        let server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .expect("test server failed");
        });

        Self {
            addr,
            hub,
            health,
            cancel_token,
            hub_task,
            server_task,
        }
    }

    /// `ws://` URL of the signaling endpoint.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// `http://` URL for `path`.
    #[must_use]
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Cancel everything and wait for the hub and listener to stop.
    pub async fn shutdown(self) {
        self.health.set_not_ready();
        self.cancel_token.cancel();
        self.hub_task.await.expect("hub task panicked");
        self.server_task.await.expect("server task panicked");
    }
}
