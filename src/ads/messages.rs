//! JSON wire types for the Google Ads REST `generateKeywordIdeas` call and the
//! OAuth token endpoint.
//!
//! Proto int64 fields are rendered as JSON strings by the REST transport, and
//! enums as their names, so both are decoded leniently here.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::types::{IdeaPage, IdeaRequest, KeywordIdea, KeywordIdeaMetrics};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeywordIdeasRequest<'a> {
    pub language: String,
    pub geo_target_constants: Vec<String>,
    pub include_adult_keywords: bool,
    pub keyword_plan_network: &'static str,
    pub keyword_seed: KeywordSeed<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct KeywordSeed<'a> {
    pub keywords: &'a [String],
}

impl<'a> GenerateKeywordIdeasRequest<'a> {
    pub fn new(request: &'a IdeaRequest, page_token: Option<&'a str>) -> Self {
        Self {
            language: format!("languageConstants/{}", request.language_id),
            geo_target_constants: vec![format!("geoTargetConstants/{}", request.geo_target_id)],
            include_adult_keywords: false,
            keyword_plan_network: "GOOGLE_SEARCH",
            keyword_seed: KeywordSeed { keywords: &request.keywords },
            page_size: request.page_size,
            page_token,
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeywordIdeasResponse {
    #[serde(default)]
    pub results: Vec<WireIdea>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIdea {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub keyword_idea_metrics: Option<WireMetrics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMetrics {
    #[serde(default, deserialize_with = "int64")]
    pub avg_monthly_searches: Option<i64>,
    #[serde(default)]
    pub competition: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "int64")]
    pub low_top_of_page_bid_micros: Option<i64>,
    #[serde(default, deserialize_with = "int64")]
    pub high_top_of_page_bid_micros: Option<i64>,
}

impl From<GenerateKeywordIdeasResponse> for IdeaPage {
    fn from(resp: GenerateKeywordIdeasResponse) -> Self {
        let ideas = resp
            .results
            .into_iter()
            .map(|w| {
                let m = w.keyword_idea_metrics.unwrap_or_default();
                KeywordIdea {
                    text: w.text,
                    metrics: KeywordIdeaMetrics {
                        avg_monthly_searches: m.avg_monthly_searches,
                        competition: m.competition.as_ref().map(competition_code).unwrap_or(0),
                        low_top_of_page_bid_micros: m.low_top_of_page_bid_micros,
                        high_top_of_page_bid_micros: m.high_top_of_page_bid_micros,
                    },
                }
            })
            .collect();
        IdeaPage {
            ideas,
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Enum name → competition code (LOW=1, MEDIUM=2, HIGH=3, anything else 0).
/// Integer values pass through unchanged.
pub fn competition_code(v: &serde_json::Value) -> i64 {
    match v {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0),
        serde_json::Value::String(s) => match s.to_ascii_uppercase().as_str() {
            "LOW" => 1,
            "MEDIUM" => 2,
            "HIGH" => 3,
            _ => 0,
        },
        _ => 0,
    }
}

fn int64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

/// A `GoogleAdsFailure` detail. Other detail types simply have no `errors`.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub errors: Vec<FailureError>,
}

#[derive(Debug, Deserialize)]
pub struct FailureError {
    #[serde(default)]
    pub message: Option<String>,
}

/// Build an `AppError::Upstream` from a non-success response.
pub fn upstream_error(status: reqwest::StatusCode, body: &str) -> AppError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let message = env
                .error
                .details
                .iter()
                .find_map(|d| d.errors.first())
                .and_then(|e| e.message.clone());
            let code = env
                .error
                .status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
            AppError::Upstream { code, message: message.or(env.error.message) }
        }
        Err(_) => {
            let trimmed = body.trim();
            AppError::Upstream {
                code: format!("HTTP_{}", status.as_u16()),
                message: (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RefreshTokenGrant<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(d) => write!(f, "{}: {}", self.error, d),
            None => write!(f, "{}", self.error),
        }
    }
}
