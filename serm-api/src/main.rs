mod error;
mod handlers;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use serm::{load_config, MemoryRepository, Monitor, XmlProxyClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("serm-api")
        .version("0.1.0")
        .about("HTTP API for the SERM monitoring bot")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("YAML configuration file (defaults to $SERM_CONFIG)"),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .action(ArgAction::SetTrue)
                .help("Keep users and keywords in memory instead of PostgreSQL"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = load_config(config_path.as_deref()).await?;

    let monitor = if matches.get_flag("memory") {
        tracing::warn!("using in-memory storage, data is lost on exit");
        let provider = XmlProxyClient::new(config.provider.clone())?;
        Monitor::new(Arc::new(MemoryRepository::new()), Arc::new(provider))
    } else {
        Monitor::connect(&config).await?
    };

    let app = handlers::router(Arc::new(monitor));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!("HTTP server listening on {}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serm::parse_config_string;

    #[test]
    fn test_shipped_config_parses() {
        let config = parse_config_string(include_str!("../serm.yaml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8200");
        assert_eq!(config.provider.user, None);
        assert_eq!(config.database.pool_size, 16);
    }
}
