//! promptimage: subscription-gated image generation backend.
//!
//! Startup order: configuration, tracing, ledger, ledger worker, HTTP.
//! Ctrl-C stops the server and then lets the worker drain its queue.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use promptimage::adapters::auth::{FirebaseConfig, FirebaseSessionValidator};
use promptimage::adapters::http::{api_router, AuthState, BillingAppState, GenerationAppState};
use promptimage::adapters::ledger::InMemorySubscriptionLedger;
use promptimage::adapters::paystack::{PaystackConfig, PaystackGateway};
use promptimage::adapters::postgres::{run_migrations, PostgresSubscriptionLedger};
use promptimage::adapters::queue::ChannelIngestionQueue;
use promptimage::adapters::replicate::{ReplicateConfig, ReplicateImageGenerator};
use promptimage::application::handlers::billing::{
    CheckoutSettings, EntitlementResolver, InitializeTransactionHandler, LedgerWorker,
    ProviderBinding, ReceiveWebhookHandler, VerifyTransactionHandler,
};
use promptimage::application::handlers::generation::{
    CreatePredictionHandler, GenerationGate, GetPredictionHandler,
};
use promptimage::config::{AppConfig, DatabaseConfig, ServerConfig};
use promptimage::domain::billing::BillingProvider;
use promptimage::ports::{ImageGenerator, PaymentGateway, SubscriptionLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    config.validate().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;
    let production = config.is_production();

    info!(environment = ?config.server.environment, "Starting promptimage");

    // Ledger
    let ledger = build_ledger(&config.database).await?;
    let resolver = EntitlementResolver::new(ledger.clone(), config.entitlement.policy());

    // Ingestion: endpoint -> queue -> worker
    let (queue, jobs) = ChannelIngestionQueue::bounded(config.ingestion.queue_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = LedgerWorker::new(ledger.clone(), config.ingestion.retry_policy()?);
    let worker_handle = tokio::spawn(worker.run(jobs, shutdown_rx));

    let mut webhooks = ReceiveWebhookHandler::new(Arc::new(queue)).with_provider(
        BillingProvider::Paystack,
        ProviderBinding::paystack(
            SecretString::new(config.payment.paystack_secret_key.clone()),
            config.payment.allow_list(BillingProvider::Paystack, production)?,
        ),
    );
    match config.payment.paddle_secret() {
        Some(secret) => {
            webhooks = webhooks.with_provider(
                BillingProvider::Paddle,
                ProviderBinding::paddle(
                    SecretString::new(secret.to_string()),
                    config.payment.allow_list(BillingProvider::Paddle, production)?,
                    config.payment.paddle_signature_max_age_secs,
                ),
            );
        }
        None => warn!("Paddle webhook secret not set, Paddle webhooks disabled"),
    }

    // Paystack checkout
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackGateway::new(
        PaystackConfig::new(SecretString::new(config.payment.paystack_secret_key.clone()))
            .with_base_url(config.payment.paystack_base_url.clone()),
    ));
    let checkout = CheckoutSettings {
        amount: config.payment.checkout_amount,
        plan: config.payment.plan_code.clone(),
        callback_url: config.payment.callback_url.clone(),
    };

    let billing = BillingAppState {
        webhooks: Arc::new(webhooks),
        resolver: resolver.clone(),
        initialize: Arc::new(InitializeTransactionHandler::new(gateway.clone(), checkout)),
        verify: Arc::new(VerifyTransactionHandler::new(gateway, ledger, resolver.clone())),
    };

    // Generation
    let generator: Arc<dyn ImageGenerator> = Arc::new(ReplicateImageGenerator::new(
        ReplicateConfig::new(
            SecretString::new(config.generation.replicate_api_token.clone()),
            config.generation.model_version.clone(),
        )
        .with_base_url(config.generation.base_url.clone())
        .with_webhook_host(config.generation.webhook_host.clone())
        .with_submit_retries(
            config.generation.submit_attempts,
            config.generation.submit_retry_delay(),
        ),
    ));
    let gate = GenerationGate::new(resolver);
    let generation = GenerationAppState {
        create: Arc::new(CreatePredictionHandler::new(gate.clone(), generator.clone())),
        get: Arc::new(GetPredictionHandler::new(gate, generator)),
    };

    // Identity
    let auth: AuthState = Arc::new(FirebaseSessionValidator::new(
        FirebaseConfig::new(config.auth.firebase_project_id.clone())
            .with_cache_duration(config.auth.jwks_cache_ttl()),
    ));

    let app = api_router(billing, generation, auth)
        .layer(cors_layer(&config.server))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP server stopped, draining ledger worker");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        error!(error = %e, "Ledger worker task failed");
    }

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

async fn build_ledger(
    database: &DatabaseConfig,
) -> Result<Arc<dyn SubscriptionLedger>, Box<dyn std::error::Error>> {
    let Some(url) = database.url() else {
        warn!("No database URL configured, using in-memory ledger (entries are lost on restart)");
        return Ok(Arc::new(InMemorySubscriptionLedger::new()));
    };

    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(url)
        .await?;
    info!("Database connected");

    if database.run_migrations {
        run_migrations(&pool).await?;
        info!("Migrations applied");
    }

    Ok(Arc::new(PostgresSubscriptionLedger::new(pool)))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() && !server.is_production() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
