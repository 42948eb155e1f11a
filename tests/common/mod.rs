//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use config_aggregator::config::{Configuration, RouteConfig};
use config_aggregator::{Message, Pool, Provider, ProviderError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Per-read bound used by every test that drains the aggregated channel.
#[allow(dead_code)]
pub const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// A configurable in-memory provider.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    pub name: String,
    pub messages: usize,
    pub delay: Duration,
    pub fail_init: bool,
    pub fail_provide: bool,
    pub panic_on_provide: bool,
    pub provide_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(name: &str, messages: usize) -> Self {
        Self {
            name: name.to_string(),
            messages,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_provide(mut self) -> Self {
        self.fail_provide = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_provide = true;
        self
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self) -> Result<(), ProviderError> {
        if self.fail_init {
            return Err(ProviderError::Config(format!("{} refuses to start", self.name)));
        }
        Ok(())
    }

    async fn provide(&self, out: mpsc::Sender<Message>, _pool: Pool) -> Result<(), ProviderError> {
        self.provide_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_provide {
            panic!("{} crashed", self.name);
        }
        if self.fail_provide {
            return Err(ProviderError::Config(format!("{} lost its backend", self.name)));
        }

        for i in 0..self.messages {
            tokio::time::sleep(self.delay).await;
            out.send(Message::new(self.name.clone(), configuration_named(&format!("{}-{i}", self.name))))
                .await
                .map_err(|_| ProviderError::Closed)?;
        }
        Ok(())
    }
}

/// A snapshot holding a single route called `route`.
#[allow(dead_code)]
pub fn configuration_named(route: &str) -> Configuration {
    Configuration {
        routes: vec![RouteConfig {
            name: route.to_string(),
            host: None,
            path_prefix: Some("/".into()),
            backend_group: "web".into(),
            priority: 0,
        }],
        backends: Vec::new(),
    }
}

/// Receive with [`READ_TIMEOUT`]; `None` on timeout or closed channel.
#[allow(dead_code)]
pub async fn recv_timeout(rx: &mut mpsc::Receiver<Message>) -> Option<Message> {
    tokio::time::timeout(READ_TIMEOUT, rx.recv()).await.ok().flatten()
}

/// Start a programmable mock backend with async support.
///
/// Every connection is answered with whatever `f` returns, then closed.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                // Requests are tiny GETs; one read takes the whole head.
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
}
