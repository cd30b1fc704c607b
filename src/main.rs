//! framepace server binary

use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framepace::{Server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "framepace", about = "Stream paced raster frames over WebSocket", version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, value_name = "PATH", env = "FRAMEPACE_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port (default 8080)
    #[arg(long, env = "FRAMEPACE_PORT")]
    port: Option<u16>,

    /// Listening interface (default 0.0.0.0)
    #[arg(long, value_name = "IP", env = "FRAMEPACE_BIND")]
    bind: Option<IpAddr>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-level", env = "FRAMEPACE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(ip) = self.bind {
            config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.server_config()?;
    let server = match Server::bind(config.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!("Cannot start server: {}", e);
            return Err(e).context(format!("binding {}", config.bind_addr));
        }
    };

    let addr = server.local_addr()?;
    info!("Listening on port {}...", addr.port());

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                ctrl_c.cancel();
            }
            Err(e) => error!("Cannot listen for interrupts: {}", e),
        }
    });

    server.run(shutdown).await?;
    Ok(())
}
