use std::io::{Error, ErrorKind};
use std::sync::Arc;

use clap::Parser;
use log::info;
use tokio::net::TcpListener;
use tokio::signal;

use pack_server::config::Config;
use pack_server::limiter::RateLimiter;
use pack_server::processor::OrderProcessor;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // install global collector configured based on RUST_LOG env var.
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    config
        .validate()
        .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
    info!("configuration loaded");

    let processor = Arc::new(OrderProcessor::new(
        config.max_order_quantity,
        config.cache_capacity,
    ));
    if !config.packs.is_empty() {
        processor
            .set_packs(&config.startup_packs())
            .await
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
    }
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limiter_enabled(),
        config.rate_limit_max_requests,
    ));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    pack_server::server::run(listener, processor, limiter, signal::ctrl_c()).await;
    Ok(())
}
