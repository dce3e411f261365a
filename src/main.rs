use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::notifications::webhook::WebhookNotifier;
use salonbook::services::notifications::{NoopNotifier, Notifier};
use salonbook::services::payments::stripe::StripeProvider;
use salonbook::services::payments::PaymentProvider;
use salonbook::services::scheduling::LifecycleManager;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    anyhow::ensure!(
        !config.stripe_secret_key.is_empty(),
        "STRIPE_SECRET_KEY must be set"
    );
    let payments: Arc<dyn PaymentProvider> =
        Arc::new(StripeProvider::new(config.stripe_secret_key.clone()));

    let notifier: Arc<dyn Notifier> = if config.notify_webhook_url.is_empty() {
        tracing::warn!("NOTIFY_WEBHOOK_URL not set, notifications disabled");
        Arc::new(NoopNotifier)
    } else {
        Arc::new(WebhookNotifier::new(config.notify_webhook_url.clone()))
    };

    let (events_tx, _) = broadcast::channel(256);

    let lifecycle = LifecycleManager::new(
        Arc::clone(&db),
        payments,
        notifier,
        events_tx.clone(),
        config.cancel_notice_hours,
        config.currency.clone(),
    )?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        lifecycle,
        events_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::services::list))
        .route("/api/services", post(handlers::services::create))
        .route("/api/services/:id", get(handlers::services::get))
        .route("/api/services/:id", put(handlers::services::update))
        .route("/api/stylists", get(handlers::stylists::list))
        .route("/api/stylists", post(handlers::stylists::create))
        .route("/api/stylists/:id", get(handlers::stylists::get))
        .route(
            "/api/stylists/:id/schedule",
            get(handlers::stylists::schedule),
        )
        .route(
            "/api/stylists/:id/bookings",
            get(handlers::stylists::bookings),
        )
        .route("/api/bookings", post(handlers::bookings::create))
        .route("/api/bookings", get(handlers::bookings::list))
        .route(
            "/api/bookings/recurring",
            post(handlers::bookings::create_recurring),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get))
        .route("/api/bookings/:id/confirm", post(handlers::bookings::confirm))
        .route("/api/bookings/:id/start", post(handlers::bookings::start))
        .route(
            "/api/bookings/:id/complete",
            post(handlers::bookings::complete),
        )
        .route("/api/bookings/:id/no-show", post(handlers::bookings::no_show))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel))
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::bookings::reschedule),
        )
        .route("/api/bookings/:id/review", post(handlers::bookings::review))
        .route(
            "/api/payments/intent",
            post(handlers::payments::create_intent),
        )
        .route("/api/payments/confirm", post(handlers::payments::confirm))
        .route("/api/payments/refund", post(handlers::payments::refund))
        .route("/api/payments/webhook", post(handlers::payments::webhook))
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        .route(
            "/api/dashboard/events",
            get(handlers::dashboard::events_stream),
        )
        .route(
            "/api/admin/reminders/run",
            post(handlers::admin::run_reminders),
        )
        .route(
            "/calendar/stylists/:id/feed.ics",
            get(handlers::calendar::stylist_feed),
        )
        .route("/calendar/:booking_id", get(handlers::calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
