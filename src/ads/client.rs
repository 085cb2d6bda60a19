use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::ads::messages::{
    upstream_error, GenerateKeywordIdeasRequest, GenerateKeywordIdeasResponse, RefreshTokenGrant,
    TokenError, TokenResponse,
};
use crate::aggregator::{KeywordIdeaSource, SourceConnector};
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{AppError, Result};
use crate::types::{IdeaPage, IdeaRequest};

/// Where the Ads API and the OAuth token endpoint live.
#[derive(Debug, Clone)]
pub struct AdsEndpoints {
    pub api_url: String,
    pub api_version: String,
    pub oauth_token_url: String,
}

impl AdsEndpoints {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            api_url: cfg.ads_api_url.trim_end_matches('/').to_string(),
            api_version: cfg.ads_api_version.clone(),
            oauth_token_url: cfg.oauth_token_url.clone(),
        }
    }

    fn ideas_url(&self, customer_id: &str) -> String {
        format!(
            "{}/{}/customers/{}:generateKeywordIdeas",
            self.api_url, self.api_version, customer_id
        )
    }
}

/// Builds an authenticated [`AdsClient`] per request from the shared HTTP pool.
pub struct AdsConnector {
    http: reqwest::Client,
    endpoints: AdsEndpoints,
    latency: Arc<LatencyStats>,
}

impl AdsConnector {
    pub fn new(cfg: &Config, latency: Arc<LatencyStats>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.upstream_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoints: AdsEndpoints::from_config(cfg),
            latency,
        })
    }
}

#[async_trait]
impl SourceConnector for AdsConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
        customer_id: &str,
    ) -> Result<Box<dyn KeywordIdeaSource>> {
        let client = AdsClient::connect(
            self.http.clone(),
            &self.endpoints,
            credentials,
            customer_id,
            Arc::clone(&self.latency),
        )
        .await?;
        Ok(Box::new(client))
    }
}

/// Google Ads REST client bound to one customer and one access token.
pub struct AdsClient {
    http: reqwest::Client,
    ideas_url: String,
    developer_token: String,
    login_customer_id: Option<String>,
    access_token: String,
    latency: Arc<LatencyStats>,
}

impl AdsClient {
    /// Exchange the refresh token for an access token and bind to `customer_id`.
    pub async fn connect(
        http: reqwest::Client,
        endpoints: &AdsEndpoints,
        credentials: &Credentials,
        customer_id: &str,
        latency: Arc<LatencyStats>,
    ) -> Result<Self> {
        let access_token = fetch_access_token(&http, &endpoints.oauth_token_url, credentials).await?;
        Ok(Self {
            http,
            ideas_url: endpoints.ideas_url(customer_id),
            developer_token: credentials.developer_token.clone(),
            login_customer_id: credentials.login_customer_id.clone(),
            access_token,
            latency,
        })
    }
}

#[async_trait]
impl KeywordIdeaSource for AdsClient {
    async fn fetch_page(&self, request: &IdeaRequest, page_token: Option<&str>) -> Result<IdeaPage> {
        let body = GenerateKeywordIdeasRequest::new(request, page_token);
        let mut req = self
            .http
            .post(&self.ideas_url)
            .bearer_auth(&self.access_token)
            .header("developer-token", &self.developer_token)
            .json(&body);
        if let Some(id) = &self.login_customer_id {
            req = req.header("login-customer-id", id);
        }

        let started = Instant::now();
        let sent = req.send().await;
        self.latency.record(started.elapsed());
        let resp = sent?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let err = upstream_error(status, &text);
            warn!("[ADS] generateKeywordIdeas failed ({}): {err}", status.as_u16());
            return Err(err);
        }

        let parsed: GenerateKeywordIdeasResponse = serde_json::from_str(&text)?;
        let page = IdeaPage::from(parsed);
        debug!(
            "[ADS] page: {} ideas for {} seeds in {:.0}ms (more={})",
            page.ideas.len(),
            request.keywords.len(),
            started.elapsed().as_secs_f64() * 1000.0,
            page.next_page_token.is_some(),
        );
        Ok(page)
    }
}

async fn fetch_access_token(
    http: &reqwest::Client,
    token_url: &str,
    credentials: &Credentials,
) -> Result<String> {
    let grant = RefreshTokenGrant {
        grant_type: "refresh_token",
        client_id: &credentials.client_id,
        client_secret: &credentials.client_secret,
        refresh_token: &credentials.refresh_token,
    };
    let resp = http.post(token_url).form(&grant).send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let reason = serde_json::from_str::<TokenError>(&text)
            .map(|e| e.to_string())
            .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
        warn!("[ADS] OAuth token exchange failed: {reason}");
        return Err(AppError::Auth(reason));
    }

    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            developer_token: "dev-token".into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
            login_customer_id: Some("1234567890".into()),
        }
    }

    fn endpoints(server: &MockServer) -> AdsEndpoints {
        AdsEndpoints {
            api_url: server.base_url(),
            api_version: "v21".into(),
            oauth_token_url: server.url("/token"),
        }
    }

    fn request(keywords: &[&str]) -> IdeaRequest {
        IdeaRequest {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            geo_target_id: "2756".into(),
            language_id: "1001".into(),
            page_size: None,
        }
    }

    async fn token_ok(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=refresh_token")
                    .body_contains("refresh_token=refresh");
                then.status(200)
                    .json_body(json!({"access_token": "ya29.test", "expires_in": 3599, "token_type": "Bearer"}));
            })
            .await
    }

    #[tokio::test]
    async fn fetches_ideas_with_auth_headers() {
        let server = MockServer::start_async().await;
        let token_mock = token_ok(&server).await;
        let ideas_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v21/customers/1234567890:generateKeywordIdeas")
                    .header("authorization", "Bearer ya29.test")
                    .header("developer-token", "dev-token")
                    .header("login-customer-id", "1234567890")
                    .json_body_partial(r#"{"keywordSeed": {"keywords": ["shoes"]}, "keywordPlanNetwork": "GOOGLE_SEARCH"}"#);
                then.status(200).json_body(json!({
                    "results": [{"text": "running shoes", "keywordIdeaMetrics": {
                        "avgMonthlySearches": "880", "competition": "MEDIUM",
                        "lowTopOfPageBidMicros": "700000", "highTopOfPageBidMicros": "1900000"}}],
                    "totalSize": "1"
                }));
            })
            .await;

        let latency = Arc::new(LatencyStats::new());
        let client = AdsClient::connect(
            reqwest::Client::new(),
            &endpoints(&server),
            &credentials(),
            "1234567890",
            Arc::clone(&latency),
        )
        .await
        .unwrap();
        let page = client.fetch_page(&request(&["shoes"]), None).await.unwrap();

        token_mock.assert_async().await;
        ideas_mock.assert_async().await;
        assert_eq!(page.ideas.len(), 1);
        assert_eq!(page.ideas[0].text, "running shoes");
        assert_eq!(page.ideas[0].metrics.avg_monthly_searches, Some(880));
        assert_eq!(page.ideas[0].metrics.competition, 2);
        assert!(page.next_page_token.is_none());
        assert_eq!(latency.len(), 1);
    }

    #[tokio::test]
    async fn sends_page_token_and_size() {
        let server = MockServer::start_async().await;
        token_ok(&server).await;
        let ideas_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v21/customers/1234567890:generateKeywordIdeas")
                    .json_body_partial(r#"{"pageToken": "next-1", "pageSize": 1}"#);
                then.status(200).json_body(json!({"results": []}));
            })
            .await;

        let client = AdsClient::connect(
            reqwest::Client::new(),
            &endpoints(&server),
            &credentials(),
            "1234567890",
            Arc::new(LatencyStats::new()),
        )
        .await
        .unwrap();
        let mut req = request(&["shoes"]);
        req.page_size = Some(1);
        let page = client.fetch_page(&req, Some("next-1")).await.unwrap();

        ideas_mock.assert_async().await;
        assert!(page.ideas.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_becomes_upstream_error() {
        let server = MockServer::start_async().await;
        token_ok(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v21/customers/1234567890:generateKeywordIdeas");
                then.status(403).json_body(json!({"error": {
                    "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED",
                    "details": [{"@type": "type.googleapis.com/google.ads.googleads.v21.errors.GoogleAdsFailure",
                                 "errors": [{"message": "The developer token is not approved."}]}]}}));
            })
            .await;

        let client = AdsClient::connect(
            reqwest::Client::new(),
            &endpoints(&server),
            &credentials(),
            "1234567890",
            Arc::new(LatencyStats::new()),
        )
        .await
        .unwrap();
        let err = client.fetch_page(&request(&["shoes"]), None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Google Ads API error: PERMISSION_DENIED - The developer token is not approved."
        );
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400)
                    .json_body(json!({"error": "invalid_grant", "error_description": "Token has been expired or revoked."}));
            })
            .await;

        let result = AdsClient::connect(
            reqwest::Client::new(),
            &endpoints(&server),
            &credentials(),
            "1234567890",
            Arc::new(LatencyStats::new()),
        )
        .await;
        match result {
            Err(AppError::Auth(reason)) => {
                assert_eq!(reason, "invalid_grant: Token has been expired or revoked.")
            }
            Err(other) => panic!("expected Auth error, got {other:?}"),
            Ok(_) => panic!("expected Auth error, got a client"),
        }
    }

    #[test]
    fn ideas_url_layout() {
        let e = AdsEndpoints {
            api_url: "https://googleads.googleapis.com".into(),
            api_version: "v21".into(),
            oauth_token_url: String::new(),
        };
        assert_eq!(
            e.ideas_url("42"),
            "https://googleads.googleapis.com/v21/customers/42:generateKeywordIdeas"
        );
    }
}
