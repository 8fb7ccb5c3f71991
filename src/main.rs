use std::path::PathBuf;

use clap::Parser;

use transfer_service::config::resolve_config;
use transfer_service::lifecycle::{spawn_signal_handler, Application};
use transfer_service::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "transfer-service")]
#[command(about = "Money transfer HTTP service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "TRANSFER_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, env = "TRANSFER_BIND_ADDRESS")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref(), args.bind)?;

    init_logging(&config.observability)?;
    tracing::info!("transfer-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let app = Application::build(config).await?;
    tracing::info!(address = %app.local_addr()?, "Listening for connections");

    spawn_signal_handler(app.shutdown_handle());
    app.run().await?;
    Ok(())
}
