use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::aggregator::{aggregate, probe, SourceConnector};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::{
    language_id, Config, CREDENTIAL_TEST_DEFAULT_KEYWORD, CREDENTIAL_TEST_KEYWORD_LIMIT,
    DEFAULT_COUNTRY, DEFAULT_LANGUAGE,
};
use crate::credentials::{CredentialSet, Credentials};
use crate::error::{AppError, CredentialCheckError, Result};
use crate::types::{lenient_string, IdeaRequest, KeywordQuery, ResultRecord};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub connector: Arc<dyn SourceConnector>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/generate-keyword-ideas", post(generate_keyword_ideas))
        .route("/test-credentials", post(test_credentials))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestCredentialsRequest {
    #[serde(default)]
    pub credentials: Option<CredentialSet>,
    /// Anything other than a non-empty array falls back to the default seed.
    #[serde(default)]
    pub keywords: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub keywords: Vec<ResultRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCredentialsResponse {
    pub success: bool,
    pub keywords_returned: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub upstream_failures: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime_secs: state.health.uptime_secs(),
        requests_served: state.health.requests_served(),
        upstream_failures: state.health.upstream_failures(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_ms, p95_ms, p99_ms) = state.latency.percentiles_ms();
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms,
        p95_ms,
        p99_ms,
    })
}

async fn generate_keyword_ideas(
    State(state): State<ApiState>,
    body: Bytes,
) -> std::result::Result<Json<GenerateResponse>, AppError> {
    state.health.inc_requests_served();
    match run_generate(&state, &body).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            log_failure(&state, "[KEYWORDS]", &e);
            Err(e)
        }
    }
}

async fn run_generate(state: &ApiState, body: &Bytes) -> Result<GenerateResponse> {
    let cfg = &state.config;
    let req: GenerateRequest = parse_body(body)?;

    let query = KeywordQuery::new(
        req.keywords.unwrap_or_default(),
        resolve_country(req.country),
        resolve_language(req.language),
        cfg.min_search_volume,
        cfg.max_keywords,
    )?;

    let credentials = Credentials::build(&cfg.credentials, None)?;
    let customer_id = credentials.login_customer_id.clone().ok_or_else(|| {
        AppError::Validation("GOOGLE_ADS_LOGIN_CUSTOMER_ID is not configured".to_string())
    })?;

    let source = state.connector.connect(&credentials, &customer_id).await?;
    let result = aggregate(&query, source.as_ref()).await?;

    Ok(GenerateResponse {
        success: true,
        total: result.total(),
        keywords: result.records,
    })
}

async fn test_credentials(
    State(state): State<ApiState>,
    body: Bytes,
) -> std::result::Result<Json<TestCredentialsResponse>, CredentialCheckError> {
    state.health.inc_requests_served();
    match run_credential_test(&state, &body).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            log_failure(&state, "[CREDENTIALS]", &e);
            Err(e.into())
        }
    }
}

async fn run_credential_test(state: &ApiState, body: &Bytes) -> Result<TestCredentialsResponse> {
    let req: TestCredentialsRequest = parse_body(body)?;
    let overrides = req.credentials.unwrap_or_default();
    let keywords = seed_keywords(req.keywords);
    let country = resolve_country(req.country);
    let language = resolve_language(req.language);

    let credentials = Credentials::build(&state.config.credentials, Some(&overrides))?;
    let customer_id = credentials.login_customer_id.clone().ok_or_else(|| {
        AppError::Validation("login_customer_id is required to test credentials".to_string())
    })?;

    let source = state.connector.connect(&credentials, &customer_id).await?;
    let request = IdeaRequest {
        keywords,
        geo_target_id: country,
        language_id: language_id(&language).to_string(),
        page_size: None,
    };
    let count = probe(&request, source.as_ref()).await?;

    info!("[CREDENTIALS] credentials for customer {customer_id} are valid ({count} ideas)");
    Ok(TestCredentialsResponse {
        success: true,
        keywords_returned: count,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}

fn resolve_country(country: Option<String>) -> String {
    country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
}

/// Lower-cased; missing or empty means the default language.
fn resolve_language(language: Option<String>) -> String {
    language
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
        .to_lowercase()
}

fn seed_keywords(keywords: Option<serde_json::Value>) -> Vec<String> {
    let seeds: Vec<String> = match keywords {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .take(CREDENTIAL_TEST_KEYWORD_LIMIT)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if seeds.is_empty() {
        vec![CREDENTIAL_TEST_DEFAULT_KEYWORD.to_string()]
    } else {
        seeds
    }
}

fn log_failure(state: &ApiState, tag: &str, e: &AppError) {
    match e {
        AppError::Validation(msg) => warn!("{tag} validation error: {msg}"),
        AppError::Upstream { .. } | AppError::Auth(_) => {
            state.health.inc_upstream_failures();
            error!("{tag} upstream error: {e}");
        }
        _ => error!("{tag} error: {e}"),
    }
}
