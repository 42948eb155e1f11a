//! REST provider.
//!
//! Accepts full configuration snapshots pushed over HTTP:
//!
//! ```text
//! PUT /api/providers/rest   (JSON Configuration body)
//!     → 200 accepted
//!     → 400/422 malformed body (axum's Json rejection)
//!     → 404 for any other provider name
//! ```
//!
//! Handlers write into a ring channel, so a slow consumer never holds up an
//! HTTP client. If pushes arrive faster than they are consumed, only the
//! latest one is guaranteed to be delivered.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::config::schema::RestProviderConfig;
use crate::config::Configuration;
use crate::lifecycle::Pool;
use crate::provider::ring::{ring_channel, RingSender};
use crate::provider::{send_configuration, Message, Provider, ProviderError};

const NAME: &str = "rest";

#[derive(Clone)]
struct RestState {
    ring: RingSender<Configuration>,
}

/// Provider fed by HTTP pushes.
#[derive(Debug)]
pub struct RestProvider {
    config: RestProviderConfig,
    addr: Option<SocketAddr>,
}

impl RestProvider {
    pub fn new(config: RestProviderConfig) -> Self {
        Self { config, addr: None }
    }

    fn router(ring: RingSender<Configuration>) -> Router {
        Router::new()
            .route("/api/providers/{provider}", put(put_configuration))
            .with_state(RestState { ring })
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Provider for RestProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self) -> Result<(), ProviderError> {
        let addr = self.config.bind_address.parse().map_err(|_| {
            ProviderError::Config(format!("invalid bind address: {}", self.config.bind_address))
        })?;
        self.addr = Some(addr);
        Ok(())
    }

    async fn provide(&self, out: mpsc::Sender<Message>, pool: Pool) -> Result<(), ProviderError> {
        let addr = self
            .addr
            .ok_or_else(|| ProviderError::Config("provider used before init".to_string()))?;

        let listener = TcpListener::bind(addr).await.map_err(|source| ProviderError::Io {
            path: addr.to_string(),
            source,
        })?;

        let (ring_tx, mut ring_rx) = ring_channel::<Configuration>();
        let app = Self::router(ring_tx);

        pool.go_ctx(move |mut stop| async move {
            tracing::info!(provider = NAME, address = %addr, "REST provider listening");
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.stopped().await })
                .await;
            if let Err(e) = served {
                tracing::error!(provider = NAME, error = %e, "REST provider server failed");
            }
            tracing::info!(provider = NAME, "REST provider stopped");
        });

        // Ends on stop, or once the server and with it the last ring sender
        // is gone.
        pool.go_ctx(move |mut stop| async move {
            loop {
                let configuration = tokio::select! {
                    _ = stop.stopped() => break,
                    next = ring_rx.read() => match next {
                        Some(configuration) => configuration,
                        None => break,
                    },
                };

                tokio::select! {
                    _ = stop.stopped() => break,
                    sent = send_configuration(&out, NAME, configuration) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(provider = NAME, "REST forwarder stopped");
        });

        Ok(())
    }
}

async fn put_configuration(
    State(state): State<RestState>,
    Path(provider): Path<String>,
    Json(configuration): Json<Configuration>,
) -> impl IntoResponse {
    if provider != NAME {
        return (StatusCode::NOT_FOUND, format!("unknown provider: {provider}"));
    }

    tracing::debug!(
        provider = NAME,
        routes = configuration.routes.len(),
        backends = configuration.backends.len(),
        "Configuration pushed"
    );

    if state.ring.write(configuration) {
        (StatusCode::OK, "configuration accepted".to_string())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "provider stopped".to_string())
    }
}
