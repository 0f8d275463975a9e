mod accounts;
mod config;
mod rpc;
mod server;
mod service;
mod tx_format;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::rpc::RpcTransactionSource;
use crate::service::LookupService;
use crate::tx_format::JsonParserFactory;
use crate::utils::redact_url;

fn init_tracing() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing();

    info!(
        rpc_url = %redact_url(&config.rpc_url),
        rpc_timeout_secs = config.rpc_timeout_secs,
        "starting transaction lookup service"
    );

    let source = RpcTransactionSource::new(&config.rpc_url, config.rpc_timeout());
    let service = LookupService::new(Arc::new(source), Arc::new(JsonParserFactory));

    server::serve(config.bind_addr(), Arc::new(service)).await
}
