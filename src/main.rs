use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

use daansetu_backend::api;
use daansetu_backend::config::AppConfig;
use daansetu_backend::database::campaign_repository::CampaignRepository;
use daansetu_backend::database::donation_repository::DonationRepository;
use daansetu_backend::database::user_repository::UserRepository;
use daansetu_backend::database::webhook_event_repository::WebhookEventRepository;
use daansetu_backend::database::init_pool_from_config;
use daansetu_backend::gateway::provider::PaymentGateway;
use daansetu_backend::gateway::razorpay::RazorpayGateway;
use daansetu_backend::health::{HealthChecker, HealthState, HealthStatus};
use daansetu_backend::logging::init_tracing;
use daansetu_backend::middleware::auth::AuthVerifier;
use daansetu_backend::middleware::logging::{request_logging_middleware, UuidRequestId};
use daansetu_backend::services::donation_service::DonationService;
use daansetu_backend::services::verification::VerificationService;
use daansetu_backend::services::webhook_processor::WebhookProcessor;

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Daansetu backend service"
    );

    info!("Initializing database connection pool...");
    let db_pool = init_pool_from_config(&config.database).await.map_err(|e| {
        error!("Failed to initialize database pool: {}", e);
        anyhow::anyhow!(e)
    })?;
    info!(
        max_connections = config.database.max_connections,
        "Database connection pool initialized"
    );

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(RazorpayGateway::new(config.gateway.clone()).map_err(|e| {
            error!("Failed to initialize payment gateway: {}", e);
            anyhow::anyhow!(e)
        })?);
    info!(base_url = %config.gateway.base_url, "Payment gateway client initialized");

    let campaigns = Arc::new(CampaignRepository::new(db_pool.clone()));
    let donations = Arc::new(DonationRepository::new(db_pool.clone()));
    let users = Arc::new(UserRepository::new(db_pool.clone()));
    let events = Arc::new(WebhookEventRepository::new(db_pool.clone()));

    let donation_service = Arc::new(DonationService::new(
        gateway.clone(),
        donations.clone(),
        campaigns.clone(),
        users.clone(),
        config.gateway.currency.clone(),
    ));
    let verification = Arc::new(VerificationService::new(
        db_pool.clone(),
        gateway.clone(),
        donations.clone(),
        campaigns.clone(),
    ));
    let webhook_processor = Arc::new(WebhookProcessor::new(
        gateway.clone(),
        events,
        verification.clone(),
    ));

    let auth = Arc::new(AuthVerifier::new(&config.auth));
    let health_checker = HealthChecker::new(db_pool.clone(), config.gateway.clone());

    let allowed_origins = config
        .server
        .cors_allowed_origins
        .iter()
        .map(|origin| origin.parse::<axum::http::HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin: {e}"))?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("Setting up application routes...");

    let campaign_routes = Router::new()
        .route(
            "/api/campaign",
            post(api::campaigns::create_campaign).get(api::campaigns::list_campaigns),
        )
        .route(
            "/api/campaign/{id}/extend",
            put(api::campaigns::extend_campaign),
        )
        .with_state(api::campaigns::CampaignState {
            campaigns: campaigns.clone(),
            auth: auth.clone(),
        });

    let donation_routes = Router::new()
        .route("/api/donate", post(api::donations::create_order))
        .route("/api/donate/verify", post(api::donations::verify_payment))
        .route("/api/donate/public", get(api::donations::public_campaigns))
        .route(
            "/api/donate/{referralCode}",
            get(api::donations::campaigns_by_referral),
        )
        .route("/api/donations", get(api::donations::list_donations))
        .with_state(api::donations::DonationState {
            donation_service,
            verification,
            campaigns,
            donations,
            users,
            auth,
        });

    let webhook_routes = Router::new()
        .route(
            "/api/webhooks/razorpay",
            post(api::webhooks::razorpay_webhook),
        )
        .with_state(api::webhooks::WebhookState {
            processor: webhook_processor,
        });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/health/live", get(liveness))
        .with_state(AppState { health_checker })
        .merge(campaign_routes)
        .merge(donation_routes)
        .merge(webhook_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        );

    info!("Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

#[derive(Clone)]
struct AppState {
    health_checker: HealthChecker,
}

async fn root() -> &'static str {
    "Daansetu Backend API"
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let health_status = state.health_checker.check_health().await;

    if matches!(health_status.status, HealthState::Unhealthy) {
        error!("Health check failed - service unhealthy");
        Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    } else {
        Ok(Json(health_status))
    }
}

/// Readiness probe: checks all dependencies
async fn readiness(
    state: axum::extract::State<AppState>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    health(state).await
}

/// Liveness probe: the process is up
async fn liveness() -> &'static str {
    "OK"
}
