// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use p2e_inferno_relay::{
    api::router,
    blockchain::{
        signing::{load_service_signer, wallet_from_signer},
        ChainClient, DgPayout, EasSubmitter,
    },
    config::AppConfig,
    notifications::TelegramNotifier,
    state::AppState,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Attach chain access, the service wallet and Telegram to `state`.
fn wire_services(mut state: AppState) -> Result<AppState, BoxError> {
    let config = state.config.clone();

    let chain = ChainClient::new(config.network, &config.rpc_url)?;
    state = state.with_chain(Arc::new(chain));
    info!(network = config.network.slug, rpc_url = %config.rpc_url, "Chain client ready");

    match &config.service_key {
        Some(source) => {
            let signer = load_service_signer(source)?;
            info!(address = %signer.address(), "Service wallet loaded");
            let wallet = wallet_from_signer(signer);

            if config.eas.enabled {
                let submitter =
                    EasSubmitter::new(&config.rpc_url, config.eas.contract_address, wallet.clone())?;
                state = state.with_submitter(Arc::new(submitter));
            }
            if let Some(token) = config.dg_token_address {
                let payout = DgPayout::new(config.network, &config.rpc_url, token, wallet)?;
                state = state.with_payout(Arc::new(payout));
                info!(token = %token, "DG withdrawals enabled");
            }
        }
        None => warn!("No service key configured; attestations and withdrawals are unavailable"),
    }

    if let Some(token) = &config.telegram_bot_token {
        state = state.with_notifier(Arc::new(TelegramNotifier::new(token)?));
        info!("Telegram notifications enabled");
    }

    Ok(state)
}

async fn shutdown_signal(shutdown: CancellationToken, handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let tls_paths = config.tls_cert_path.clone().zip(config.tls_key_path.clone());

    let state = wire_services(AppState::open(config)?)?;

    if let Some(jwks) = &state.auth_config.jwks {
        match jwks.refresh().await {
            Ok(()) => info!("Privy JWKS loaded"),
            Err(e) => warn!(error = %e, "Privy JWKS warm-up failed; retrying on first request"),
        }
    } else {
        warn!("PRIVY_JWKS_URL not set; tokens are not signature-verified");
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(state.csp_throttle.clone().run_reset_loop(shutdown.clone()));

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_signal(shutdown.clone(), handle.clone()));

    let app = router(state);

    match tls_paths {
        Some((cert, key)) => {
            let tls_config = RustlsConfig::from_pem_file(&cert, &key).await?;
            info!("P2E Inferno relay listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("P2E Inferno relay listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    info!("Relay stopped");
    Ok(())
}
