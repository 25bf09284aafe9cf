//! Unicred issuer server.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use unicred_oid4vci::keystore::Keyring;
use unicred_oid4vci::provider::StateStore;
use unicred_server::{AppState, Config, HttpRegistrar, IssuerProvider, router};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // the issuer cannot sign anything without a key
    let keyring = Keyring::load_or_generate(&config.key_path).context("provisioning signing key")?;
    let registrar = HttpRegistrar::new(config.ledger_url.clone(), config.ledger_timeout())?;
    let provider =
        IssuerProvider::new(keyring, config.lifetimes(), config.issuer_name.clone(), registrar);

    if let Some(interval) = config.sweep_interval() {
        tokio::spawn(sweep(provider.clone(), interval));
    }

    let app = router(AppState::new(config.issuer_url.clone(), provider));
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(issuer = %config.issuer_url, "listening on {}", config.listen);

    axum::serve(listener, app).with_graceful_shutdown(shutdown()).await.context("serving")
}

// Reclaim expired offers that were never redeemed.
async fn sweep(provider: IssuerProvider, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match StateStore::sweep(&provider).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "swept expired offers"),
            Err(e) => tracing::warn!("sweep failed: {e}"),
        }
    }
}

async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
