use std::sync::Arc;

use vacancies_mcp_gateway::{
    build_app,
    config::{Config, TransportKind},
    domain::vacancies::build_operation_registry,
    hh_client::HhApiClient,
    http::cors_layer,
    logging,
    mcp::{registry::SessionRegistry, stdio::StdioTransport},
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let source = Arc::new(HhApiClient::new(
        config.hh_api_base_url.clone(),
        config.hh_area,
    ));
    let operations = Arc::new(build_operation_registry(source)?);

    match config.transport {
        TransportKind::Stdio => {
            info!(tools = operations.len(), "serving over stdio");
            StdioTransport::new(operations).run().await?;
        }
        TransportKind::Http => {
            let bind_socket = config.bind_socket()?;
            let state = AppState::new(operations);
            let sessions = state.sessions.clone();
            let app = build_app(state, cors_layer(config.cors_allow_origin.clone()));
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                "server starting"
            );

            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal(sessions))
                .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal(sessions: Arc<SessionRegistry>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }

    let closed = sessions.close_all();
    info!(closed_sessions = closed, "shutting down");
}
