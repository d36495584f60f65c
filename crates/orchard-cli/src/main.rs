use anyhow::{Context, Result};
use clap::Parser;
use orchard_core::{App, AppState, Server, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "orchard=info";

#[derive(Parser)]
#[command(name = "orchard")]
#[command(about = "In-memory fruit stand HTTP service")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServerConfig::new(cli.port);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> Result<()> {
    let state = AppState::seeded().context("Failed to load seed fruits")?;
    let app = App::build(state, &config).context("Failed to register routes")?;
    let server = Server::new(app, config);

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("ctrl-c received");
        })
        .await
        .with_context(|| format!("Server on port {} failed", server.config().port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        // targets match by prefix, so this covers orchard_core and orchard_router
        let (target, level) = DEFAULT_LOG_FILTER.split_once('=').unwrap();
        assert!(module_path!().starts_with(target));
        assert!("orchard_core::middleware::logger".starts_with(target));
        assert_eq!(level, "info");
    }

    #[test]
    fn test_default_port() {
        let cli = Cli::try_parse_from(["orchard"]).unwrap();
        assert_eq!(cli.port, 3000);
    }

    #[test]
    fn test_port_flag() {
        assert_eq!(Cli::try_parse_from(["orchard", "--port", "8080"]).unwrap().port, 8080);
        assert_eq!(Cli::try_parse_from(["orchard", "-p", "9"]).unwrap().port, 9);
        assert!(Cli::try_parse_from(["orchard", "--port", "http"]).is_err());
    }
}
