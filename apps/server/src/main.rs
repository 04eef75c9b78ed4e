use atelier_server::config::Config;
use atelier_server::main_lib::{build_router, build_state, init_tracing};
use atelier_server::scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let state = build_state(&config).await?;

    if config.scheduler_enabled {
        scheduler::start_sync_scheduler(state.clone());
    }

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Atelier server listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;

    Ok(())
}
