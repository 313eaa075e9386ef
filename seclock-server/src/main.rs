//! Second Lock licensing service
//!
//! Holds the deployment's license, checks it against activated users and the
//! services in the registry, and serves the cached result.
//!
//! Usage:
//!   SECONDLOCK_REGISTRY_URI=http://registry:8080 seclock-server

use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use seclock_license::{
    ComplianceChecker, HttpRegistryClient, HttpUserClient, KeyManager, LicenseCodec, LicenseCycle,
    LicenseManager, LicenseService, SqliteStore,
};
use seclock_server::{build_router, config::Args, AppState, SelfReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Second Lock licensing service starting...");

    let store = Arc::new(
        SqliteStore::open(&args.database_path)
            .with_context(|| format!("Failed to open {}", args.database_path.display()))?,
    );

    let keys = Arc::new(KeyManager::with_key_bits(store.clone(), args.key_bits));
    if keys.ensure_keypair().await.context("Failed to prepare license key pair")? {
        info!("Generated new license key pair");
    }

    let codec = Arc::new(LicenseCodec::new(store.clone()));
    let manager = Arc::new(LicenseManager::new(store.clone(), keys.clone(), codec));

    let remote = args.remote_config();
    let registry = Arc::new(HttpRegistryClient::new(&remote)?);
    let users = Arc::new(HttpUserClient::new(&remote)?);
    let checker = Arc::new(ComplianceChecker::new(
        manager.clone(),
        registry.clone(),
        registry,
        users,
    ));

    let cycle = Arc::new(LicenseCycle::new(checker.clone(), store, args.cycle_config()));
    cycle.init().await;

    let state = AppState {
        service: LicenseService::new(keys, manager, checker, cycle.clone()),
        identity: Arc::new(SelfReport {
            id: args.service_id.clone(),
            name: args.service_name.clone(),
        }),
    };

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Licensing API listening on {}", args.listen);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;

    cycle.shutdown();
    info!("Second Lock licensing service stopped");
    Ok(())
}
