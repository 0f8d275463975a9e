use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use clap::Parser;

pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "swaptx",
    version,
    about = "Solana transaction and swap lookup service"
)]
pub struct Config {
    /// RPC endpoint used to fetch transactions, may embed an api key
    #[arg(long, env = "SWAPTX_RPC_URL", default_value = MAINNET_RPC_URL)]
    pub rpc_url: String,
    /// Address to bind the HTTP listener on
    #[arg(long, env = "SWAPTX_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    /// Port to bind the HTTP listener on
    #[arg(long, env = "SWAPTX_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Upper bound for a single RPC request, in seconds
    #[arg(
        long,
        env = "SWAPTX_RPC_TIMEOUT_SECS",
        default_value_t = DEFAULT_RPC_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rpc_timeout_secs: u64,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}
