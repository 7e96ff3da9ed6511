//! HTTP serving of the dashboard page and its reactive endpoints

use crate::{
    config::Config,
    dataset::{BarSeries, Dataset, Mode},
    kwic::{self, KwicStore, KwicUpdate},
    Keyword, Result, Year,
};
use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Dashboard page, embedded so the binary can serve it directly
const INDEX_TEMPLATE: &str = include_str!("../static/index.html");

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Process configuration
    pub config: Arc<Config>,

    /// Frequency tables and the keyword catalog
    pub dataset: Arc<Dataset>,

    /// KWIC store, when one is configured
    pub kwic: Option<Arc<KwicStore>>,
}

/// Serve the dashboard until the process is terminated
pub async fn run(state: AppState) -> Result<()> {
    let config = state.config.clone();
    let listener = TcpListener::bind((&*config.host, config.port))
        .await
        .with_context(|| format!("binding to {}:{}", config.host, config.port))?;
    log::info!(
        "serving the {:?} dashboard on http://{}:{}",
        config.corpus.id,
        config.host,
        config.port
    );
    axum::serve(listener, router(state))
        .await
        .context("serving the dashboard")
}

/// Build the application routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/meta", get(meta_handler))
        .route("/api/series", get(series_handler))
        .route("/api/kwic", get(kwic_handler))
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_TEMPLATE)
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Everything the page needs to configure itself
#[derive(Debug, Serialize)]
struct Meta {
    /// Dashboard title
    title: &'static str,

    /// Version of this program
    version: &'static str,

    /// Keyword initially selected
    default_keyword: Option<Keyword>,

    /// Keyword catalog, in display order
    keywords: Box<[Keyword]>,

    /// Normalization modes that can be requested
    modes: [Mode; 2],

    /// Truth that KWIC retrieval is available
    kwic: bool,
}

async fn meta_handler(State(state): State<AppState>) -> Json<Meta> {
    let keywords = Box::from(state.dataset.catalog());
    Json(Meta {
        title: state.config.corpus.title,
        version: env!("CARGO_PKG_VERSION"),
        default_keyword: state.dataset.catalog().first().cloned(),
        keywords,
        modes: Mode::ALL,
        kwic: state.kwic.is_some(),
    })
}

/// Parameters of a frequency series request
#[derive(Debug, Deserialize)]
struct SeriesQuery {
    /// Keyword to plot
    keyword: String,

    /// Normalization mode
    #[serde(default)]
    mode: Mode,
}

/// Figure in the shape the plotting library consumes
#[derive(Debug, Serialize)]
struct Figure {
    /// Traces to draw
    data: [BarSeries; 1],
}

async fn series_handler(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> impl IntoResponse {
    log::debug!("frequency series request: {query:?}");
    match state.dataset.series(&query.keyword, query.mode) {
        Some(series) => (StatusCode::OK, Json(Figure { data: [series] })).into_response(),
        None => {
            let body = serde_json::json!({
                "error": format!("unknown keyword {:?}", query.keyword),
            });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

/// Parameters of a KWIC refresh request
#[derive(Debug, Deserialize)]
struct KwicQuery {
    /// Keyword to look up
    #[serde(default)]
    keyword: String,

    /// Selected years, as a comma-separated list
    #[serde(default)]
    years: String,
}

async fn kwic_handler(
    State(state): State<AppState>,
    Query(query): Query<KwicQuery>,
) -> impl IntoResponse {
    log::debug!("KWIC request: {query:?}");
    let years = match parse_years(&query.years) {
        Ok(years) => years,
        Err(e) => {
            let body = serde_json::json!({ "error": format!("{e:#}") });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };
    match kwic::refresh(state.kwic.as_deref(), &query.keyword, &years).await {
        Ok(KwicUpdate::Update(rows)) => (StatusCode::OK, Json(rows.as_ref())).into_response(),
        Ok(KwicUpdate::NoChange) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            log::error!("KWIC lookup failed: {e:#}");
            let body = serde_json::json!({ "error": "KWIC lookup failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Decode the year selection of a KWIC request
///
/// Order and duplicates are preserved, an empty parameter is an empty
/// selection.
fn parse_years(years: &str) -> Result<Box<[Year]>> {
    if years.is_empty() {
        return Ok(Box::default());
    }
    years
        .split(',')
        .map(|year| {
            year.trim()
                .parse::<Year>()
                .with_context(|| format!("parsing selected year {year:?}"))
        })
        .collect()
}
