use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use donations_backend::api;
use donations_backend::api::campaigns::CampaignApiState;
use donations_backend::api::donations::DonationApiState;
use donations_backend::api::webhooks::WebhookState;
use donations_backend::config::AppConfig;
use donations_backend::database;
use donations_backend::database::campaign_repository::CampaignRepository;
use donations_backend::database::donation_repository::DonationRepository;
use donations_backend::database::donor_repository::DonorRepository;
use donations_backend::database::settings_repository::SettingsRepository;
use donations_backend::database::store::{
    CampaignStore, DonationStore, DonorStore, SettingsStore,
};
use donations_backend::gateway::razorpay::RazorpayClient;
use donations_backend::gateway::DonationGateway;
use donations_backend::logging::init_tracing;
use donations_backend::middleware::auth::{require_bearer, AuthState};
use donations_backend::services::{
    DonationOrderService, LogMailer, PaymentVerificationService, ReceiptService, StatsRefresher,
    WebhookProcessor,
};

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

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "donations-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    config.validate()?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        "🚀 Starting donations backend service"
    );

    info!(
        host = %config.server.host,
        port = config.server.port,
        gateway_base_url = %config.gateway.base_url,
        "Server configuration loaded"
    );

    info!("📊 Initializing database connection pool...");
    let pool = database::init_pool_from_config(&config.database)
        .await
        .map_err(|e| {
            error!("Failed to initialize database pool: {}", e);
            anyhow::anyhow!(e)
        })?;
    info!("✅ Database connection pool initialized");

    let settings: Arc<dyn SettingsStore> = Arc::new(SettingsRepository::new(pool.clone()));
    let donors: Arc<dyn DonorStore> = Arc::new(DonorRepository::new(pool.clone()));
    let campaigns: Arc<dyn CampaignStore> = Arc::new(CampaignRepository::new(pool.clone()));
    let donations: Arc<dyn DonationStore> = Arc::new(DonationRepository::new(pool.clone()));

    let gateway: Arc<dyn DonationGateway> = Arc::new(RazorpayClient::new(&config.gateway)?);

    let stats = Arc::new(StatsRefresher::new(donors.clone(), campaigns.clone()));
    let receipts = Arc::new(ReceiptService::new(Arc::new(LogMailer)));

    let order_service = Arc::new(DonationOrderService::new(
        settings.clone(),
        donors.clone(),
        campaigns.clone(),
        donations.clone(),
        gateway.clone(),
    ));
    let verification_service = Arc::new(PaymentVerificationService::new(
        settings.clone(),
        donations.clone(),
        gateway.clone(),
        stats.clone(),
        receipts.clone(),
    ));
    let webhook_processor = Arc::new(WebhookProcessor::new(
        settings.clone(),
        donations.clone(),
        stats.clone(),
        receipts.clone(),
    ));

    info!("🛣️  Setting up application routes...");

    let donation_state = Arc::new(DonationApiState {
        orders: order_service,
        verification: verification_service,
        donations: donations.clone(),
    });
    let donation_routes = Router::new()
        .route("/api/donations/orders", post(api::donations::create_order))
        .route("/api/donations/verify", post(api::donations::verify_payment))
        .with_state(donation_state.clone());

    // Reporting endpoints expose donor data and sit behind the shared
    // bearer token.
    let auth_state = Arc::new(AuthState {
        api_token: config.auth.api_token.clone(),
    });
    let reporting_routes = Router::new()
        .route("/api/donations/stats", get(api::donations::get_stats))
        .route("/api/donations/recent", get(api::donations::recent_donations))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            require_bearer,
        ))
        .with_state(donation_state);

    let campaign_state = Arc::new(CampaignApiState {
        campaigns: campaigns.clone(),
    });
    let campaign_routes = Router::new()
        .route("/api/campaigns", get(api::campaigns::list_campaigns))
        .with_state(campaign_state);

    let webhook_state = Arc::new(WebhookState {
        processor: webhook_processor,
    });
    let webhook_routes = Router::new()
        .route("/webhooks/razorpay", post(api::webhooks::handle_webhook))
        .with_state(webhook_state);

    let health_pool = pool.clone();
    let app = Router::new()
        .route("/", get(root))
        .route(
            "/health",
            get(move || {
                let pool = health_pool.clone();
                async move {
                    match database::health_check(&pool).await {
                        Ok(()) => (
                            StatusCode::OK,
                            Json(serde_json::json!({"status": "healthy"})),
                        ),
                        Err(e) => (
                            StatusCode::SERVICE_UNAVAILABLE,
                            Json(serde_json::json!({"status": "unhealthy", "error": e.to_string()})),
                        ),
                    }
                }
            }),
        )
        .merge(donation_routes)
        .merge(reporting_routes)
        .merge(campaign_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "✅ Donations backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
