//! payment-core server binary.
//!
//! Wires configuration, storage, cache, gateways and the event queue into the
//! HTTP router, runs the webhook maintenance tasks and shuts everything down
//! on Ctrl-C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use payment_core::adapters::cache::{InMemoryPaymentCache, RedisPaymentCache};
use payment_core::adapters::events::{InMemoryEventBus, QueuedEventPublisher};
use payment_core::adapters::gateway::GatewayRegistry;
use payment_core::adapters::http::{self, HttpSettings, PaymentAppState, TokenAppState, WebhookAppState};
use payment_core::adapters::memory::{
    InMemoryPaymentRepository, InMemoryPaymentTokenRepository, InMemoryWebhookEventRepository,
};
use payment_core::adapters::postgres::{
    PostgresPaymentRepository, PostgresPaymentTokenRepository, PostgresWebhookEventRepository,
};
use payment_core::application::handlers::payment::PaymentWriter;
use payment_core::application::handlers::webhook::payment_webhook_handlers;
use payment_core::config::{AppConfig, DatabaseConfig, PaymentsConfig};
use payment_core::domain::foundation::Timestamp;
use payment_core::domain::webhook::WebhookProcessor;
use payment_core::ports::{
    EventPublisher, PaymentCache, PaymentRepository, PaymentTokenRepository, WebhookEventRepository,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

struct Repositories {
    payments: Arc<dyn PaymentRepository>,
    tokens: Arc<dyn PaymentTokenRepository>,
    webhooks: Arc<dyn WebhookEventRepository>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        gateways = config.gateways.len(),
        "Starting payment-core"
    );

    let repositories = match &config.database {
        Some(database) => postgres_repositories(database).await?,
        None => {
            tracing::warn!("No database configured; using in-memory repositories");
            Repositories {
                payments: Arc::new(InMemoryPaymentRepository::new()),
                tokens: Arc::new(InMemoryPaymentTokenRepository::new()),
                webhooks: Arc::new(InMemoryWebhookEventRepository::new()),
            }
        }
    };

    let cache: Arc<dyn PaymentCache> = match &config.redis {
        Some(redis) => {
            Arc::new(RedisPaymentCache::connect(&redis.url, redis.key_prefix.clone(), config.payments.cache_ttl()).await?)
        }
        None => Arc::new(InMemoryPaymentCache::new(config.payments.cache_ttl())),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Events: handlers enqueue, a worker drains into the in-process bus
    let bus = Arc::new(InMemoryEventBus::new());
    let (publisher, worker) = QueuedEventPublisher::new(config.payments.event_queue_capacity, bus);
    let publisher: Arc<dyn EventPublisher> = Arc::new(publisher);
    let worker_handle = tokio::spawn(worker.run(shutdown_rx.clone()));

    let gateways = Arc::new(GatewayRegistry::from_configs(&config.gateways));
    let writer = PaymentWriter::new(repositories.payments.clone(), cache.clone(), publisher);
    let processor = Arc::new(WebhookProcessor::new(
        repositories.webhooks.clone(),
        Arc::new(payment_webhook_handlers(writer.clone())),
    ));

    spawn_webhook_maintenance(processor.clone(), &config.payments, shutdown_rx.clone());

    let app = http::router(
        PaymentAppState {
            writer,
            repository: repositories.payments,
            cache,
            gateways,
            gateway_deadline: config.payments.gateway_deadline(),
        },
        WebhookAppState::new(processor, &config.gateways, config.payments.webhook_signature_tolerance_secs),
        TokenAppState {
            repository: repositories.tokens,
        },
        &HttpSettings {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down background tasks");
    let _ = shutdown_tx.send(true);
    match worker_handle.await {
        Ok(delivered) => tracing::info!(delivered, "Event queue drained"),
        Err(err) => tracing::warn!(error = %err, "Event queue worker ended abnormally"),
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.server.use_json_logs() {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

async fn postgres_repositories(config: &DatabaseConfig) -> Result<Repositories, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(config.url.expose_secret())
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Repositories {
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        tokens: Arc::new(PostgresPaymentTokenRepository::new(pool.clone())),
        webhooks: Arc::new(PostgresWebhookEventRepository::new(pool)),
    })
}

/// Periodic retry of failed webhooks and purge of settled ones.
fn spawn_webhook_maintenance(
    processor: Arc<WebhookProcessor>,
    payments: &PaymentsConfig,
    shutdown: watch::Receiver<bool>,
) {
    if let Some(every) = payments.webhook_retry_interval() {
        let processor = processor.clone();
        let batch = payments.webhook_retry_batch;
        let mut shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => match processor.retry_failed(batch).await {
                        Ok(summary) if summary.retried > 0 => tracing::info!(
                            retried = summary.retried,
                            succeeded = summary.succeeded,
                            failed = summary.failed,
                            "Webhook retry sweep"
                        ),
                        Ok(_) => {}
                        Err(err) => tracing::warn!(error = %err, "Webhook retry sweep failed"),
                    },
                }
            }
        });
    }

    let retention_days = payments.webhook_retention_days;
    if retention_days > 0 {
        let mut shutdown = shutdown;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        let cutoff = Timestamp::now().minus_days(retention_days);
                        if let Err(err) = processor.purge_before(cutoff).await {
                            tracing::warn!(error = %err, "Webhook purge failed");
                        }
                    }
                }
            }
        });
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
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
    tracing::info!("Shutdown signal received");
}
