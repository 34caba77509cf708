use std::sync::Arc;

use clap::Parser;
use pmtiles_edge::config::{AppState, CliArgs, Config};
use pmtiles_edge::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let cfg = Config::load(&args)?;

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let state = Arc::new(AppState::new(cfg).await?);

    logger::log_server_start(&addr, &state);
    server::start_server_loop(listener, state).await;
    Ok(())
}
