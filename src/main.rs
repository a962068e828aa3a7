use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

mod binding;
mod config;
mod dao;
mod error;
mod handler;
mod http;
mod logger;
mod model;
mod routing;
mod server;
mod session;
mod view;

/// How long shutdown waits for in-flight connections
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;

    // Size the runtime from `server.workers`, defaulting to the CPU count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(config::AppState::new(&cfg));
    let active_connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&local_addr, &cfg, state.routes.len());
    logger::log_info(&format!(
        "Session cookie '{}', timeout {}s, max body {} bytes, max connections {:?}",
        cfg.session.cookie_name,
        cfg.session.timeout_secs,
        cfg.http.max_body_size,
        cfg.performance.max_connections
    ));

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    server::start_server_loop(
        listener,
        state,
        Arc::clone(&active_connections),
        Arc::clone(&signals.shutdown),
    )
    .await;

    server::drain_connections(&active_connections, SHUTDOWN_DRAIN_TIMEOUT).await;
    Ok(())
}
