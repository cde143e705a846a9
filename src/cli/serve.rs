//! `serve` command.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::app::App;
use crate::error::{MatchdayError, Result};
use crate::server;

/// Run the HTTP service until Ctrl-C.
///
/// # Errors
///
/// Invalid bind address or the port cannot be bound.
pub async fn execute(app: App) -> Result<()> {
    let server_config = &app.config().server;
    let ip: IpAddr = server_config
        .bind
        .parse()
        .map_err(|e: std::net::AddrParseError| MatchdayError::ConfigInvalid {
            key: "server.bind".to_string(),
            value: server_config.bind.clone(),
            message: e.to_string(),
        })?;
    let addr = SocketAddr::new(ip, server_config.port);
    tracing::info!(
        %addr,
        bases = app.config().upstream.api_bases.len(),
        "Starting matchday service"
    );
    server::serve(Arc::new(app), addr).await
}
