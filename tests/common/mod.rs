//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use transfer_service::config::{AppConfig, ListenerConfig};
use transfer_service::http::{Dispatcher, HttpServer};
use transfer_service::lifecycle::{Application, Shutdown, StartupError};
use transfer_service::net::Listener;
use transfer_service::routing::RouteTable;

/// Defaults with an ephemeral port and immediate withdrawal settlement.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.withdrawals.poll_interval_ms = 20;
    config.withdrawals.min_settle_ms = 0;
    config.withdrawals.max_settle_ms = 0;
    config
}

pub struct RunningApp {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), StartupError>>,
}

impl RunningApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the full application.
pub async fn spawn_app(config: AppConfig) -> RunningApp {
    let app = Application::build(config).await.unwrap();
    let addr = app.local_addr().unwrap();
    let shutdown = app.shutdown_handle();
    let task = tokio::spawn(app.run());
    RunningApp {
        addr,
        shutdown,
        task,
    }
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub dispatcher: Arc<Dispatcher>,
    pub task: JoinHandle<std::io::Result<()>>,
}

/// Start a bare HTTP server around a custom route table.
pub async fn spawn_server(config: AppConfig, routes: RouteTable) -> RunningServer {
    let listener = Listener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        max_connections: 100,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, routes);
    let dispatcher = server.dispatcher();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    RunningServer {
        addr,
        shutdown,
        dispatcher,
        task,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `condition` every 10ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Write raw bytes and read until the server closes the connection (or 5s pass).
pub async fn raw_request(addr: SocketAddr, bytes: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(bytes).await.unwrap();

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
            Ok(Ok(n)) => response.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&response).into_owned()
}
