use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

/// Micro-units per whole currency unit for upstream bid amounts.
pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KeywordQuery {
    pub keywords: Vec<String>,
    /// Geo target constant id, e.g. "2756".
    pub country: String,
    /// Language code as received, e.g. "de". Resolved to a constant id per batch.
    pub language: String,
    pub min_search_volume: u64,
    pub max_results: usize,
}

impl KeywordQuery {
    pub fn new(
        keywords: Vec<String>,
        country: impl Into<String>,
        language: impl Into<String>,
        min_search_volume: u64,
        max_results: usize,
    ) -> Result<Self> {
        if keywords.is_empty() {
            return Err(AppError::Validation("No keywords provided".to_string()));
        }
        if max_results == 0 {
            return Err(AppError::Validation("maxResults must be greater than 0".to_string()));
        }
        Ok(Self {
            keywords,
            country: country.into(),
            language: language.into(),
            min_search_volume,
            max_results,
        })
    }
}

// ---------------------------------------------------------------------------
// Upstream ideas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordIdea {
    pub text: String,
    pub metrics: KeywordIdeaMetrics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordIdeaMetrics {
    pub avg_monthly_searches: Option<i64>,
    /// 0 unknown, 1 low, 2 medium, 3 high.
    pub competition: i64,
    pub low_top_of_page_bid_micros: Option<i64>,
    pub high_top_of_page_bid_micros: Option<i64>,
}

/// Parameters of a single upstream `generateKeywordIdeas` call.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaRequest {
    pub keywords: Vec<String>,
    pub geo_target_id: String,
    pub language_id: String,
    pub page_size: Option<u32>,
}

/// One page of the upstream paged response.
#[derive(Debug, Clone, Default)]
pub struct IdeaPage {
    pub ideas: Vec<KeywordIdea>,
    pub next_page_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Competition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    Unknown,
    Low,
    Medium,
    High,
}

impl Competition {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Competition::Low,
            2 => Competition::Medium,
            3 => Competition::High,
            _ => Competition::Unknown,
        }
    }
}

impl std::fmt::Display for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Competition::Unknown => "unknown",
            Competition::Low => "low",
            Competition::Medium => "medium",
            Competition::High => "high",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub keyword: String,
    pub search_volume: u64,
    pub competition: Competition,
    pub cpc: f64,
    pub cpc_high: f64,
}

impl ResultRecord {
    pub fn from_idea(idea: KeywordIdea) -> Self {
        let m = &idea.metrics;
        Self {
            search_volume: m.avg_monthly_searches.unwrap_or(0).max(0) as u64,
            competition: Competition::from_code(m.competition),
            cpc: micros_to_units(m.low_top_of_page_bid_micros),
            cpc_high: micros_to_units(m.high_top_of_page_bid_micros),
            keyword: idea.text,
        }
    }
}

/// Missing or zero bids become 0.0.
pub fn micros_to_units(micros: Option<i64>) -> f64 {
    match micros {
        Some(m) if m != 0 => m as f64 / MICROS_PER_UNIT,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub records: Vec<ResultRecord>,
}

impl AggregationResult {
    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Accepts a JSON string or number and yields its string form. `null` is treated as absent.
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
