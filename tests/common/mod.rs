//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use modular_monolith::config::ServerConfig;
use modular_monolith::di::{BoxError, Module, Registry};
use modular_monolith::http::Controller;
use modular_monolith::lifecycle::{self, Server};

/// Loopback config on an ephemeral port.
pub fn test_config(grace: Duration) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_grace_ms: grace.as_millis() as u64,
        ..ServerConfig::default()
    }
}

/// Compose `modules` and start serving on an ephemeral port.
pub async fn start_server(modules: Vec<Arc<dyn Module>>, grace: Duration) -> (Server, SocketAddr) {
    let config = test_config(grace);
    let mut server = lifecycle::bootstrap(&config, modules).await.unwrap();
    let addr = server.start(config.port).await.unwrap();
    (server, addr)
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Module with one handler that never completes.
pub struct StuckModule;

#[async_trait]
impl Module for StuckModule {
    fn name(&self) -> &str {
        "Stuck"
    }

    async fn configure(&self, _registry: &Registry) -> Result<(), BoxError> {
        Ok(())
    }

    async fn controllers(&self, _registry: &Registry) -> Result<Vec<Controller>, BoxError> {
        Ok(vec![Controller::new("/stuck").route(Method::GET, "/", stuck)])
    }
}

async fn stuck() -> &'static str {
    std::future::pending::<()>().await;
    "unreachable"
}

/// Records the message of every event emitted on this thread while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// How many events carried exactly `message`.
    pub fn count(&self, message: &str) -> usize {
        self.messages.lock().unwrap().iter().filter(|m| *m == message).count()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.messages.lock().unwrap().push(message);
        }
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
