use crate::credentials::CredentialSet;
use crate::error::{AppError, Result};

pub const GOOGLE_ADS_API_URL: &str = "https://googleads.googleapis.com";
pub const GOOGLE_ADS_API_VERSION: &str = "v21";
pub const GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Upstream hard limit: `keywordSeed.keywords` accepts at most 20 entries per request.
pub const KEYWORD_BATCH_SIZE: usize = 20;

/// Seed keywords sent by a credential test. Only the first idea is ever read.
pub const CREDENTIAL_TEST_KEYWORD_LIMIT: usize = 10;
pub const CREDENTIAL_TEST_DEFAULT_KEYWORD: &str = "test keyword";

/// Geo target constant for Switzerland.
pub const DEFAULT_COUNTRY: &str = "2756";
pub const DEFAULT_LANGUAGE: &str = "de";

/// Fallback language constant (English) for unrecognized codes.
pub const FALLBACK_LANGUAGE_ID: &str = "1000";

/// Language code → Google Ads language constant id.
pub const LANGUAGE_IDS: &[(&str, &str)] = &[
    ("de", "1001"),
    ("en", "1000"),
    ("fr", "1002"),
    ("it", "1004"),
    ("es", "1003"),
    ("nl", "1010"),
    ("pt", "1014"),
    ("pl", "1025"),
    ("ru", "1031"),
    ("ja", "1005"),
    ("zh", "1017"),
];

pub fn language_id(code: &str) -> &'static str {
    LANGUAGE_IDS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, id)| *id)
        .unwrap_or(FALLBACK_LANGUAGE_ID)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub port: u16,
    /// Ideas below this average monthly search volume are dropped (MIN_SEARCH_VOLUME)
    pub min_search_volume: u64,
    /// Cap on records returned per request (MAX_KEYWORDS)
    pub max_keywords: usize,
    pub ads_api_url: String,
    pub ads_api_version: String,
    pub oauth_token_url: String,
    pub upstream_timeout_secs: u64,
    /// Credential defaults; per-request overrides are merged on top.
    pub credentials: CredentialSet,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_keywords = std::env::var("MAX_KEYWORDS")
            .unwrap_or_else(|_| "500".to_string())
            .parse::<usize>()
            .map_err(|_| AppError::Config("MAX_KEYWORDS must be a positive integer".to_string()))?;
        if max_keywords == 0 {
            return Err(AppError::Config("MAX_KEYWORDS must be greater than 0".to_string()));
        }

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            port: std::env::var("SERVICE_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("SERVICE_PORT must be a valid port number".to_string()))?,
            min_search_volume: std::env::var("MIN_SEARCH_VOLUME")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("MIN_SEARCH_VOLUME must be a non-negative integer".to_string())
                })?,
            max_keywords,
            ads_api_url: std::env::var("GOOGLE_ADS_API_URL")
                .unwrap_or_else(|_| GOOGLE_ADS_API_URL.to_string()),
            ads_api_version: std::env::var("GOOGLE_ADS_API_VERSION")
                .unwrap_or_else(|_| GOOGLE_ADS_API_VERSION.to_string()),
            oauth_token_url: std::env::var("GOOGLE_OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| GOOGLE_OAUTH_TOKEN_URL.to_string()),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds".to_string())
                })?,
            credentials: CredentialSet {
                developer_token: non_empty_var("GOOGLE_ADS_DEVELOPER_TOKEN"),
                client_id: non_empty_var("GOOGLE_ADS_CLIENT_ID"),
                client_secret: non_empty_var("GOOGLE_ADS_CLIENT_SECRET"),
                refresh_token: non_empty_var("GOOGLE_ADS_REFRESH_TOKEN"),
                login_customer_id: non_empty_var("GOOGLE_ADS_LOGIN_CUSTOMER_ID"),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
