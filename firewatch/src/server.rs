//! HTTP surface of the gateway: the dashboard page plus a small JSON API.

use crate::dashboard::DASHBOARD_HTML;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use firewatch_core::{
    ActiveFires, AppConfig, ErrorKind, FireGateway, GatewayError,
    gateway::{ActiveFiresParams, FirmsUrlsRequest, NominatimUrlRequest},
};
use firewatch_upstream::KeyStatus;
use geojson::FeatureCollection;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

pub struct AppState {
    pub gateway: FireGateway,
}

impl AppState {
    pub fn new(gateway: FireGateway) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

/// A `GatewayError` on its way out as `{"error": {"kind", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(GatewayError::invalid(rejection.body_text()))
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidParameter => StatusCode::BAD_REQUEST,
        ErrorKind::CountryNotFound => StatusCode::NOT_FOUND,
        ErrorKind::UpstreamUnavailable | ErrorKind::MalformedUpstreamResponse => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let message = self.0.to_string();

        if status.is_server_error() {
            error!("{}: {}", kind.as_str(), message);
        } else {
            warn!("{}: {}", kind.as_str(), message);
        }

        let body = ErrorBody {
            error: ErrorDetail { kind, message },
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/health", get(health_handler))
        .route("/active-fires", get(active_fires_handler))
        .route("/active-fires.geojson", get(active_fires_geojson_handler))
        .route("/firms-status", get(firms_status_handler))
        .route("/create/nominatim_search_url", post(nominatim_url_handler))
        .route("/create/firms_csv_urls", post(firms_urls_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn load_active_fires(state: &AppState, params: &ActiveFiresParams) -> Result<ActiveFires, ApiError> {
    let request = params.validate(state.gateway.defaults())?;
    Ok(state.gateway.active_fires(&request).await?)
}

/// GET /active-fires
async fn active_fires_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveFiresParams>,
) -> Result<Json<ActiveFires>, ApiError> {
    Ok(Json(load_active_fires(&state, &params).await?))
}

/// GET /active-fires.geojson
async fn active_fires_geojson_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActiveFiresParams>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let fires = load_active_fires(&state, &params).await?;
    Ok(Json(fires.to_feature_collection()))
}

/// GET /firms-status
async fn firms_status_handler(State(state): State<Arc<AppState>>) -> Result<Json<KeyStatus>, ApiError> {
    Ok(Json(state.gateway.key_status().await?))
}

/// POST /create/nominatim_search_url
async fn nominatim_url_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NominatimUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<String>), ApiError> {
    let Json(request) = payload?;
    let url = state.gateway.nominatim_search_url(&request.country_code)?;
    Ok((StatusCode::CREATED, Json(url.into())))
}

/// POST /create/firms_csv_urls
async fn firms_urls_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FirmsUrlsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<String>>), ApiError> {
    let Json(request) = payload?;
    let urls = state.gateway.firms_urls_for(&request)?;
    Ok((
        StatusCode::CREATED,
        Json(urls.into_iter().map(String::from).collect()),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Build the gateway from `config` and serve until ctrl-c.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.server.listen))?;

    let gateway = FireGateway::from_config(config).context("Failed to set up the gateway")?;
    let app = build_router(Arc::new(AppState::new(gateway)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Firewatch listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;
    Ok(())
}
