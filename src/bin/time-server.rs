//! 测试环境时间服务器
//!
//! `GET /2021-03-30 05:25:55` sets the host clock via `timedatectl`.
use anyhow::Result;
use chain_healthcheck::api::server::{TimeServer, DEFAULT_LISTEN};
use chain_healthcheck::api::Timedatectl;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "time-server", version, about = "Lets test harnesses set the host clock over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    TimeServer::new(args.listen, Arc::new(Timedatectl)).start().await
}
