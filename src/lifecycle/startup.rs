//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Seed the ledger with the configured accounts
//! - Bind the listener, then start metrics and background tasks
//! - Begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Connections queue in the backlog until `run` starts the accept loop

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::RouteError;
use crate::transfers::{self, SettlementMonitor, TransferService, WithdrawalService, WithdrawalServiceStub};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build routes: {0}")]
    Routes(#[from] RouteError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully wired service, ready to run.
pub struct Application {
    listener: Listener,
    server: HttpServer,
    monitor: SettlementMonitor,
    service: Arc<TransferService>,
    shutdown: Shutdown,
}

impl Application {
    /// Build with the bundled withdrawal stub.
    pub async fn build(config: AppConfig) -> Result<Self, StartupError> {
        let withdrawals = Arc::new(WithdrawalServiceStub::from_config(&config.withdrawals));
        Self::build_with(config, withdrawals).await
    }

    /// Build with a caller-supplied withdrawal backend.
    pub async fn build_with(
        config: AppConfig,
        withdrawals: Arc<dyn WithdrawalService>,
    ) -> Result<Self, StartupError> {
        let service = Arc::new(TransferService::new(withdrawals));
        for seed in &config.accounts {
            service.create_account(seed.id, seed.name.clone(), seed.balance);
        }
        tracing::info!(accounts = config.accounts.len(), "Ledger seeded");

        let routes = transfers::routes(Arc::clone(&service))?;
        tracing::info!(routes = routes.len(), "Routes registered");

        let listener = Listener::bind(&config.listener).await?;

        if config.observability.metrics_enabled {
            let addr: SocketAddr = config
                .observability
                .metrics_address
                .parse()
                .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
            metrics::init_metrics(addr)?;
        }

        let monitor = SettlementMonitor::new(Arc::clone(&service), &config.withdrawals);
        let server = HttpServer::new(config, routes);

        Ok(Self {
            listener,
            server,
            monitor,
            service,
            shutdown: Shutdown::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle for stopping the application from outside.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn service(&self) -> Arc<TransferService> {
        Arc::clone(&self.service)
    }

    /// Serve until shutdown is triggered, then stop background tasks.
    pub async fn run(self) -> Result<(), StartupError> {
        let monitor = tokio::spawn(self.monitor.run(self.shutdown.subscribe()));

        let result = self.server.run(self.listener, self.shutdown.subscribe()).await;

        // The server may also stop on its own; make sure the monitor follows.
        self.shutdown.trigger("server stopped");
        if let Err(e) = monitor.await {
            tracing::error!(error = %e, "Settlement monitor task failed");
        }

        result?;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}
