//! Master — REST API for the distributed fingerprint reverse-lookup service

mod aggregate;
mod artifact;
mod broker;
mod config;
mod db;
mod events;
mod ingest;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use config::MasterConfig;
use events::EventBus;
use hashcrack_core::{CoreError, Job};

/// Application state shared across handlers
struct AppState {
    pool: sqlx::PgPool,
    broker: Arc<broker::Broker>,
    events: Arc<EventBus>,
    partition_size: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = MasterConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    let broker = Arc::new(broker::Broker::connect(&config.nats_url).await?);
    info!("Connected to NATS at {}", config.nats_url);

    let events = Arc::new(EventBus::new());

    aggregate::spawn_aggregators(
        broker.clone(),
        Arc::new(pool.clone()),
        events.clone(),
        config.results_concurrency,
    );
    info!(
        "Result aggregator started ({} tasks)",
        config.results_concurrency
    );

    let state = Arc::new(AppState {
        pool,
        broker,
        events,
        partition_size: config.partition_size,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/:job_id", get(get_job))
        .route("/api/jobs/:job_id/events", get(job_events))
        .route("/api/jobs/:job_id/results", get(job_results))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting hashcrack master on {}", config.http_addr);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn core_error_response(e: CoreError) -> (StatusCode, Json<ErrorBody>) {
    let status = match e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: e.to_string() }))
}

// === POST /api/jobs ===

#[derive(Serialize)]
struct CreateJobResponse {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    #[serde(rename = "droppedLines")]
    dropped_lines: u64,
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateJobResponse>), (StatusCode, Json<ErrorBody>)> {
    let mut body = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: format!("invalid multipart body: {e}"),
            }),
        )
    })? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        error: format!("invalid file field: {e}"),
                    }),
                )
            })?;
            body = Some(String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    let body = body.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "missing 'file' field".to_string(),
            }),
        )
    })?;

    let outcome = ingest::ingest_upload(
        &state.pool,
        &state.broker,
        &state.events,
        state.partition_size,
        &body,
    )
    .await
    .map_err(core_error_response)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateJobResponse {
            job_id: outcome.job.job_id,
            dropped_lines: outcome.dropped_lines,
        }),
    ))
}

// === GET /api/jobs ===

async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Job>>, (StatusCode, Json<ErrorBody>)> {
    let jobs = db::list_completed_jobs(&state.pool)
        .await
        .map_err(core_error_response)?;
    Ok(Json(jobs))
}

// === GET /api/jobs/:job_id ===

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, (StatusCode, Json<ErrorBody>)> {
    let job = db::get_job(&state.pool, job_id)
        .await
        .map_err(core_error_response)?
        .ok_or_else(|| core_error_response(CoreError::NotFound(job_id)))?;
    Ok(Json(job))
}

// === GET /api/jobs/:job_id/events ===

async fn job_events(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe(job_id);
    let stream = ReceiverStream::new(rx).map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().event("message").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

// === GET /api/jobs/:job_id/results ===

async fn job_results(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let rows = db::fetch_targets_with_results(&state.pool, job_id)
        .await
        .map_err(core_error_response)?
        .ok_or_else(|| core_error_response(CoreError::NotFound(job_id)))?;

    let csv = artifact::render_csv(&rows).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: format!("failed to render CSV: {e}"),
            }),
        )
    })?;

    let filename = format!("{job_id}-results.csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
