// Modules
pub mod ai;
pub mod classify;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod db;
pub mod export;
pub mod server;
pub mod store;

use config::AppConfig;
use std::sync::Arc;

/// Run the local HTTP API until Ctrl-C, then drain open connections.
pub async fn serve(config: AppConfig) -> Result<(), String> {
    let state = Arc::new(config.build_state()?);
    let running = server::start_server(state.clone(), config.port).await?;
    println!("Livewire Architect listening on http://{}", running.addr);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl-C: {}", e))?;

    log::info!("[server] Ctrl-C received, stopping");
    // Let a streaming guide settle instead of holding the shutdown open.
    if let Err(e) = commands::generation::cancel(&state) {
        log::warn!("[server] Could not cancel generation: {}", e);
    }
    running.stop().await;
    Ok(())
}
