//! huntred-flow server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use huntred_flow::adapters::http::{app_router, ConversationAppState};
use huntred_flow::adapters::{
    CatalogFlowRepository, FileConversationStore, InMemoryConversationStore,
    PostgresConversationStore, WebhookChannel, WebhookChannelConfig, YamlFlowSource,
};
use huntred_flow::application::{
    ChannelRegistry, FlowManager, InboundMessageHandler, ResponseDispatcher,
};
use huntred_flow::config::{AppConfig, StorageBackend, StorageConfig};
use huntred_flow::ports::{ConversationStore, FlowRepository};
use huntred_flow::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    telemetry::init(&config.server.log_level, config.server.log_format)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        storage = ?config.storage.backend,
        "Starting huntred-flow"
    );

    let store = build_store(&config.storage).await?;

    let source = YamlFlowSource::new(&config.flows.path);
    let flows = Arc::new(CatalogFlowRepository::from_source(&source).await?);
    let units = flows.business_units().await?;
    tracing::info!(
        path = %source.path().display(),
        business_units = ?units,
        "Flow catalog loaded"
    );

    spawn_catalog_reloader(flows.clone(), source);

    let policy = config.engine.policy(config.storage.timeout());
    let manager = Arc::new(FlowManager::new(store, flows, policy));

    let dispatcher = match &config.delivery.webhook_url {
        Some(url) => {
            let mut channel_config =
                WebhookChannelConfig::new(config.delivery.channel_name.clone(), url.clone());
            if let Some(token) = &config.delivery.webhook_token {
                channel_config = channel_config.with_token(token.clone());
            }
            let registry =
                ChannelRegistry::new().with(Arc::new(WebhookChannel::new(channel_config)?));
            tracing::info!(channels = ?registry.names(), "Delivery enabled");
            Some(Arc::new(ResponseDispatcher::new(
                Arc::new(registry),
                config.delivery.retry_policy(),
            )))
        }
        None => {
            tracing::info!("No webhook configured, responses are returned to the caller only");
            None
        }
    };

    let inbound = Arc::new(InboundMessageHandler::new(manager, dispatcher));
    let mut state = ConversationAppState::new(inbound);
    if let Some(secret) = &config.server.signing_secret {
        state = state.with_signing_secret(secret.clone());
    } else {
        tracing::warn!("No signing secret configured, inbound requests are not authenticated");
    }

    let app = app_router(state, config.server.request_timeout());
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn build_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ConversationStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn ConversationStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryConversationStore::new()),
        StorageBackend::File => Arc::new(FileConversationStore::new(&config.path)),
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.timeout())
                .connect(url)
                .await?;
            let store = PostgresConversationStore::new(pool);
            if config.run_migrations {
                store.migrate().await?;
                tracing::info!("Migrations applied");
            }
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Reloads the flow catalog on SIGHUP. A catalog that fails to load or
/// validate leaves the running flows untouched.
#[cfg(unix)]
fn spawn_catalog_reloader(flows: Arc<CatalogFlowRepository>, source: YamlFlowSource) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler");
                return;
            }
        };
        while hangup.recv().await.is_some() {
            match flows.reload(&source).await {
                Ok(units) => tracing::info!(business_units = units, "Flow catalog reloaded"),
                Err(e) => tracing::error!(error = %e, "Flow catalog reload failed"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_catalog_reloader(_flows: Arc<CatalogFlowRepository>, _source: YamlFlowSource) {}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
