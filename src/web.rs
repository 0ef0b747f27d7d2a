use crate::{
    app::{payload_from_slice, AppBackend, AppError},
    ddg::ExternalResult,
    entries::{utc_now_iso, DataFile, Entry},
    tags::{TagNode, ALL_PATH},
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

#[derive(Clone)]
struct SharedState {
    app: Arc<dyn AppBackend>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err:?}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => log::error!("failed to install signal handler: {err:?}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

fn header_layer(
    name: header::HeaderName,
    value: &'static str,
) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

pub fn router(app: Arc<dyn AppBackend>) -> Router {
    let static_dir = app.config().static_dir.clone();
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/entries",
            get(list_entries).post(create_entry).options(preflight),
        )
        .route(
            "/api/entries/:id",
            get(get_entry)
                .put(update_entry)
                .delete(delete_entry)
                .options(preflight),
        )
        .route("/api/export", get(export))
        .route("/api/import", post(import).options(preflight))
        .route("/api/tags/tree", get(tags_tree))
        .route("/api/search", get(search))
        .route("/api/external/ddg", get(external_search))
        .fallback_service(ServeDir::new(static_dir))
        .layer(header_layer(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .layer(header_layer(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type",
        ))
        .layer(header_layer(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET,POST,PUT,DELETE,OPTIONS",
        ))
        .layer(header_layer(header::CACHE_CONTROL, "no-store"))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(app: Arc<dyn AppBackend>, listen: String) -> anyhow::Result<()> {
    let router = router(app);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    log::info!("listening on {listen}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn start_daemon(app: Arc<dyn AppBackend>, listen: String) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(app, listen))
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Json(_) | AppError::IO(_) | AppError::Other(_) => {
                log::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> Json<Value> {
    Json(json!({"ok": true, "time": utc_now_iso()}))
}

async fn list_entries(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<Vec<Entry>>, HttpError> {
    let app = state.app.clone();
    tokio::task::block_in_place(move || app.list().map(Into::into).map_err(Into::into))
}

async fn create_entry(
    State(state): State<Arc<SharedState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Entry>), HttpError> {
    let payload = payload_from_slice(&body);
    log::debug!("payload: {payload:?}");

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let entry = app.create(payload)?;
        Ok((StatusCode::CREATED, entry.into()))
    })
}

async fn get_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, HttpError> {
    let app = state.app.clone();
    tokio::task::block_in_place(move || app.get(&id).map(Into::into).map_err(Into::into))
}

async fn update_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Entry>, HttpError> {
    let payload = payload_from_slice(&body);
    log::debug!("update {id}: {payload:?}");

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        app.update(&id, payload)
            .map(Into::into)
            .map_err(Into::into)
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub entry: Entry,
}

async fn delete_entry(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, HttpError> {
    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let entry = app.delete(&id)?;
        Ok(DeleteResponse {
            deleted: true,
            entry,
        }
        .into())
    })
}

async fn export(State(state): State<Arc<SharedState>>) -> Result<Json<DataFile>, HttpError> {
    let app = state.app.clone();
    tokio::task::block_in_place(move || app.export().map(Into::into).map_err(Into::into))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: usize,
}

async fn import(
    State(state): State<Arc<SharedState>>,
    body: Bytes,
) -> Result<Json<ImportResponse>, HttpError> {
    let payload = payload_from_slice(&body);

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let imported = app.import(payload)?;
        Ok(ImportResponse { imported }.into())
    })
}

async fn tags_tree(State(state): State<Arc<SharedState>>) -> Result<Json<TagNode>, HttpError> {
    let app = state.app.clone();
    tokio::task::block_in_place(move || app.tag_tree().map(Into::into).map_err(Into::into))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    ALL_PATH.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub q: String,
    pub path: String,
    pub count: usize,
    pub entries: Vec<Entry>,
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, HttpError> {
    log::debug!("search: {params:?}");

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let entries = app.search(&params.q, &params.path)?;
        Ok(SearchResponse {
            q: params.q,
            path: params.path,
            count: entries.len(),
            entries,
        }
        .into())
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalSearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExternalSearchResponse {
    pub q: String,
    pub results: Vec<ExternalResult>,
}

async fn external_search(
    State(state): State<Arc<SharedState>>,
    Query(params): Query<ExternalSearchParams>,
) -> Result<Json<ExternalSearchResponse>, HttpError> {
    let q = params.q.trim().to_string();

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let results = app.external_search(&q)?;
        Ok(ExternalSearchResponse { q, results }.into())
    })
}
