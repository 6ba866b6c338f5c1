use std::sync::Arc;

use tracing::info;

pub mod api;
pub mod routes;

pub use routes::{router, AppState};

pub fn run_server(bind_addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(bind_addr, state))
}

pub async fn serve(bind_addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(
        characters = state.repository.len(),
        "pitchsim server listening on http://{bind_addr}"
    );
    axum::serve(listener, router(state)).await
}
