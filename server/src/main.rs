use explorer_server::acceptor::{bind_listener, run_acceptor};
use explorer_server::config::ServerConfig;
use explorer_server::session::TcpDialer;
use explorer_server::world_loop::WorldHandle;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listener = match bind_listener(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let world = WorldHandle::spawn(config.clone());

    tracing::info!(
        "Explorer server listening on {} (tick {} Hz, broadcast {} Hz, mode {:?})",
        config.listen_addr,
        config.tick_rate_hz,
        config.broadcast_rate_hz,
        config.mode
    );
    println!("Explorer server listening on {}", config.listen_addr);

    run_acceptor(listener, world, Arc::new(TcpDialer), &config).await;
}
