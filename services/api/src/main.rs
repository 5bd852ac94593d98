//! API Service - Chart data for the statistics dashboard
//!
//! One endpoint per chart. Each request runs its own independent pipeline
//! pass (metadata → query → table → normalize → shape) against the
//! statistics API in the requested language; nothing is cached and no
//! state is shared between renders.
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /charts/salary - Salary time series (PA103)
//! - GET /charts/salary/sectors - Latest-year ranked sector comparison
//! - GET /charts/salary/short - Short-term salary series (PA117)
//! - GET /options/:dataset - Dropdown option lists per dimension
//!
//! A pipeline failure becomes a 502 with an error body so the frontend
//! renders an errored chart in place; other charts on the page are
//! unaffected.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use pipeline::client::{StatClient, DEFAULT_BASE_URL, TOTAL_SECTOR};
use pipeline::metadata::{DimensionOptions, OptionItem};
use pipeline::{CategoryTable, Filter, Labels, Lang, StatError, TimeSeriesTable};

// ============================================================================
// State
// ============================================================================

struct AppState {
    client: StatClient,
    labels: Labels,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

/// Envelope for every chart payload.
#[derive(Serialize)]
struct ChartResponse<T> {
    dataset: &'static str,
    lang: Lang,
    title: String,
    generated_at: DateTime<Utc>,
    table: T,
}

#[derive(Serialize)]
struct OptionsResponse {
    dataset: String,
    lang: Lang,
    dimensions: Vec<DimensionOptions>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Query params
// ============================================================================

#[derive(Deserialize)]
struct SalaryQuery {
    lang: Option<String>,
    /// Indicator code, or "ALL"/omitted for every indicator.
    indicator: Option<String>,
    /// Comma-separated sector codes; defaults to the economy-wide total.
    sector: Option<String>,
    /// Year, or "ALL"/omitted for the entire period.
    year: Option<String>,
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Deserialize)]
struct ShortQuery {
    lang: Option<String>,
    county: Option<String>,
}

fn parse_lang(param: &Option<String>) -> Lang {
    param.as_deref().and_then(Lang::parse).unwrap_or_default()
}

/// "ALL" and omission both mean "no constraint"; a comma-separated list
/// becomes a multi-value filter.
fn parse_filter(param: &Option<String>) -> Option<Filter> {
    let raw = param.as_deref()?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("ALL") {
        return None;
    }
    Some(
        raw.split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}

fn pipeline_error(err: StatError) -> axum::response::Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: "0.1.0",
    })
}

async fn salary_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SalaryQuery>,
) -> impl IntoResponse {
    let lang = parse_lang(&params.lang);
    let result = state
        .client
        .salary_series(
            parse_filter(&params.indicator),
            parse_filter(&params.sector),
            parse_filter(&params.year),
            lang,
        )
        .await;

    match result {
        Ok(table) => Json(ChartResponse::<TimeSeriesTable> {
            dataset: pipeline::client::SALARY_DATASET,
            lang,
            title: state.labels.get(lang, "salary.title").to_string(),
            generated_at: Utc::now(),
            table,
        })
        .into_response(),
        Err(err) => pipeline_error(err),
    }
}

async fn sectors_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LangQuery>,
) -> impl IntoResponse {
    let lang = parse_lang(&params.lang);
    match state.client.sector_comparison(lang).await {
        Ok(table) => Json(ChartResponse::<CategoryTable> {
            dataset: pipeline::client::SALARY_DATASET,
            lang,
            title: state
                .labels
                .get(lang, "salary.comparison.title")
                .to_string(),
            generated_at: Utc::now(),
            table,
        })
        .into_response(),
        Err(err) => pipeline_error(err),
    }
}

async fn salary_short_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShortQuery>,
) -> impl IntoResponse {
    let lang = parse_lang(&params.lang);
    let result = state
        .client
        .short_term_series(parse_filter(&params.county), lang)
        .await;

    match result {
        Ok(table) => Json(ChartResponse::<TimeSeriesTable> {
            dataset: pipeline::client::SALARY_SHORT_DATASET,
            lang,
            title: state.labels.get(lang, "salary.short.header").to_string(),
            generated_at: Utc::now(),
            table,
        })
        .into_response(),
        Err(err) => pipeline_error(err),
    }
}

async fn options_handler(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<LangQuery>,
) -> impl IntoResponse {
    let lang = parse_lang(&params.lang);
    let meta = match state.client.resolve(&dataset, lang).await {
        Ok(meta) => meta,
        Err(err) => return pipeline_error(err),
    };

    // Positional convention: indicator, category, period. Each dropdown
    // gets an "All ..." entry; the category one reuses the economy-wide
    // aggregate code when the dataset has it, and category options are
    // sorted by label like the original dropdowns.
    let all_keys = ["all.indicators", "all.sectors", "all.periods"];
    let dimensions = meta
        .options()
        .into_iter()
        .enumerate()
        .map(|(pos, mut dim)| {
            if pos == 1 {
                dim.options.sort_by(|a, b| a.label.cmp(&b.label));
            }
            let all_value = if pos == 1 && dim.options.iter().any(|o| o.value == TOTAL_SECTOR) {
                dim.options.retain(|o| o.value != TOTAL_SECTOR);
                TOTAL_SECTOR
            } else {
                "ALL"
            };
            let all_label = all_keys
                .get(pos)
                .map(|key| state.labels.get(lang, key))
                .unwrap_or("All");
            dim.options.insert(
                0,
                OptionItem {
                    value: all_value.to_string(),
                    label: all_label.to_string(),
                },
            );
            dim
        })
        .collect();

    Json(OptionsResponse {
        dataset,
        lang,
        dimensions,
    })
    .into_response()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let base_url =
        std::env::var("STAT_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let bind = std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    println!("=== Stats Dashboard API ===");
    println!("Upstream: {}", base_url);

    let client = StatClient::new(base_url, Duration::from_secs(timeout_secs))
        .context("Failed to build upstream HTTP client")?;

    let state = Arc::new(AppState {
        client,
        labels: Labels::builtin(),
    });

    // CORS for the dashboard frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/charts/salary", get(salary_handler))
        .route("/charts/salary/sectors", get(sectors_handler))
        .route("/charts/salary/short", get(salary_short_handler))
        .route("/options/:dataset", get(options_handler))
        .layer(cors)
        .with_state(state);

    println!("API listening on http://{}", bind);
    println!("\nEndpoints:");
    println!("  GET /health");
    println!("  GET /charts/salary?lang=&indicator=&sector=&year=");
    println!("  GET /charts/salary/sectors?lang=");
    println!("  GET /charts/salary/short?lang=&county=");
    println!("  GET /options/:dataset?lang=");

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
