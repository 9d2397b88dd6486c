mod api;
mod middleware;

use std::sync::Arc;

use ordersync_metafield::MetafieldClient;
use ordersync_shopify::AdminClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(ordersync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let metafield = MetafieldClient::new(
        &config.metafield_api_url,
        config.metafield_request_timeout_secs,
    )?;
    let admin = match config.shopify_admin_base_url.as_deref() {
        Some(base_url) => AdminClient::with_base_url(
            &config.shopify_api_version,
            config.shopify_request_timeout_secs,
            base_url,
        )?,
        None => AdminClient::new(
            &config.shopify_api_version,
            config.shopify_request_timeout_secs,
        )?,
    };

    if config.shop_access_tokens.is_empty() {
        tracing::warn!("SHOPIFY_SHOP_TOKENS is empty; storefront proxy calls will be refused");
    }
    if config.flow_webhook_secret.is_none() {
        tracing::warn!("FLOW_WEBHOOK_SECRET not set; Flow requests are accepted unauthenticated");
    }

    let auth = AuthState::from_env(config.is_development())?;
    let state = AppState {
        config: Arc::clone(&config),
        metafield: Arc::new(metafield),
        admin: Arc::new(admin),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        metafield_api = %config.metafield_api_url,
        "ordersync server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
