use std::net::{IpAddr, SocketAddr};

use dossier::api::{self, AppState};

use crate::commands::shared::{github_client, open_db};
use crate::config::Config;
use crate::shutdown::shutdown_signal;

/// Address to bind: flags first, then the `[server]` section.
pub(crate) fn bind_address(
    host: Option<String>,
    port: Option<u16>,
    config: &Config,
) -> Result<SocketAddr, std::net::AddrParseError> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let ip: IpAddr = host.parse()?;
    Ok(SocketAddr::new(ip, port.unwrap_or(config.server.port)))
}

pub(crate) async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = bind_address(host, port, config)?;
    let db = open_db(database_url).await?;
    let github = github_client(config, None)?;

    tracing::info!(%addr, authenticated = github.is_authenticated(), "Starting API server");
    api::serve(AppState::new(db, github), addr, shutdown_signal()).await?;
    Ok(())
}
