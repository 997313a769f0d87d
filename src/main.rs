use color_eyre::eyre::{Result, WrapErr};
use httpecho::{EchoServer, Router, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("httpecho=info")
        .init();

    // Optional port argument, default 5000
    let args: Vec<String> = std::env::args().collect();
    let port = match args.get(1) {
        Some(arg) => arg.parse::<u16>().unwrap_or_else(|_| {
            eprintln!("Usage: {} [port]", args[0]);
            eprintln!("  port: Port to bind the echo server to (default: 5000)");
            std::process::exit(1);
        }),
        None => 5000,
    };

    let config = ServerConfig {
        bind_addr: format!("0.0.0.0:{port}")
            .parse()
            .wrap_err("Invalid bind address")?,
        ..ServerConfig::default()
    };

    let router = Router::with_echo();
    let server = EchoServer::new(config.clone(), router);

    info!(address = %config.bind_addr, max_connections = config.max_connections, "Starting HTTP echo server");
    server.run().await.wrap_err("Failed to run HTTP echo server")?;

    Ok(())
}
