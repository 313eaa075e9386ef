//! Command-line and environment configuration.

use clap::Parser;
use seclock_license::{CycleConfig, RemoteConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Second Lock licensing service
#[derive(Parser, Debug, Clone)]
#[command(name = "seclock-server")]
#[command(about = "Second Lock license storage and compliance service")]
pub struct Args {
    /// Base URL of the service registry
    #[arg(long, env = "SECONDLOCK_REGISTRY_URI")]
    pub registry_uri: String,

    /// Base URL of the user service
    #[arg(long, env = "USER_SERVICE_URI", default_value = "http://localhost:8081")]
    pub user_service_uri: String,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SQLite database holding keys, license and cached state
    #[arg(long, env = "DATABASE_PATH", default_value = "seclock-license.db")]
    pub database_path: PathBuf,

    /// Name this service reports on /license
    #[arg(long, env = "SERVICE_NAME", default_value = "licensing")]
    pub service_name: String,

    /// License id this service reports on /license
    #[arg(long, env = "SERVICE_ID", default_value = "licensing")]
    pub service_id: String,

    /// Milliseconds between compliance cycles
    #[arg(long, env = "CYCLE_INTERVAL_MS", default_value = "300000")]
    pub cycle_interval_ms: u64,

    /// Timeout of one peer probe in milliseconds
    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value = "5000")]
    pub probe_timeout_ms: u64,

    /// RSA modulus size of a newly generated key pair
    #[arg(long, env = "KEY_BITS", default_value = "8192")]
    pub key_bits: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn remote_config(&self) -> RemoteConfig {
        let probe_timeout = Duration::from_millis(self.probe_timeout_ms);
        RemoteConfig {
            registry_url: self.registry_uri.clone(),
            user_service_url: self.user_service_uri.clone(),
            probe_timeout,
            request_timeout: probe_timeout,
        }
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            interval: Duration::from_millis(self.cycle_interval_ms),
            ..CycleConfig::default()
        }
    }
}
