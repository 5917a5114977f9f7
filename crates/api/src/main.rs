use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budget_buddy_core::domain::snapshot::FinancialSnapshot;
use budget_buddy_core::events::{EventBus, NotificationLevel};
use budget_buddy_core::llm::{ProviderKind, TipProvider};
use budget_buddy_core::storage::{KvStore, MemoryKvStore, PgKvStore, TipCache};
use budget_buddy_core::tips::fallback::FallbackTips;
use budget_buddy_core::tips::session::{SessionState, TipSession};
use budget_buddy_core::tips::TipGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = budget_buddy_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = open_store(&settings).await;
    let provider = TipProvider::from_settings(&settings)?;
    let generator = Arc::new(TipGenerator::new(provider, FallbackTips::new()));
    let events = Arc::new(EventBus::new());
    spawn_notification_logger(&events);

    let session = Arc::new(TipSession::new(generator, TipCache::new(store), events));
    let app = app(AppState { session });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Postgres when it is reachable, otherwise an in-memory store that forgets on restart.
async fn open_store(settings: &budget_buddy_core::config::Settings) -> Arc<dyn KvStore> {
    let db_url = match settings.require_database_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; caching tips in memory");
            return Arc::new(MemoryKvStore::new());
        }
    };

    match sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
    {
        Ok(pool) => match budget_buddy_core::storage::migrate(&pool).await {
            Ok(()) => Arc::new(PgKvStore::new(pool)),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "db migrations failed; caching tips in memory");
                Arc::new(MemoryKvStore::new())
            }
        },
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "db connect failed; caching tips in memory");
            Arc::new(MemoryKvStore::new())
        }
    }
}

fn spawn_notification_logger(events: &EventBus) {
    let mut sub = events.subscribe();
    tokio::spawn(async move {
        while let Some(n) = sub.recv().await {
            match n.level {
                NotificationLevel::Error => tracing::warn!(message = %n.message, "notification"),
                _ => tracing::info!(message = %n.message, "notification"),
            }
        }
    });
}

#[derive(Clone)]
struct AppState {
    session: Arc<TipSession>,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/provider", get(get_provider))
        .route("/tips", get(get_tips))
        .route("/tips/start", post(start_tips))
        .route("/tips/refresh", post(refresh_tips))
        .route("/tips/retry", post(retry_tips))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ApiProvider {
    provider: ProviderKind,
}

async fn get_provider(State(state): State<AppState>) -> Json<ApiProvider> {
    Json(ApiProvider {
        provider: state.session.generator().provider_kind(),
    })
}

async fn get_tips(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.state().await)
}

async fn start_tips(
    State(state): State<AppState>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Json<SessionState> {
    Json(state.session.start(&snapshot, chrono::Utc::now()).await)
}

async fn refresh_tips(
    State(state): State<AppState>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Json<SessionState> {
    Json(state.session.refresh(&snapshot, chrono::Utc::now()).await)
}

async fn retry_tips(
    State(state): State<AppState>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<SessionState>, StatusCode> {
    state
        .session
        .retry(&snapshot, chrono::Utc::now())
        .await
        .map(Json)
        .ok_or(StatusCode::CONFLICT)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &budget_buddy_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
