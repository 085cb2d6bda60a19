use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{language_id, KEYWORD_BATCH_SIZE};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::types::{AggregationResult, IdeaPage, IdeaRequest, KeywordQuery, ResultRecord};

/// Paged access to upstream keyword ideas.
#[async_trait]
pub trait KeywordIdeaSource: Send + Sync {
    /// Fetch one page of ideas for `request`. `page_token` is `None` for the first page.
    async fn fetch_page(&self, request: &IdeaRequest, page_token: Option<&str>) -> Result<IdeaPage>;
}

/// Builds an authenticated source for one inbound request.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
        customer_id: &str,
    ) -> Result<Box<dyn KeywordIdeaSource>>;
}

/// Split keywords into consecutive batches of at most `KEYWORD_BATCH_SIZE`, order preserved.
pub fn keyword_batches(keywords: &[String]) -> impl Iterator<Item = &[String]> {
    keywords.chunks(KEYWORD_BATCH_SIZE)
}

/// Run every batch of `query` against `source`, keeping ideas at or above the
/// search-volume floor until `max_results` records are collected.
///
/// Batches and pages are fetched strictly in order. Once the cap is reached no
/// further page or batch is requested and the rest of the current page is not
/// scanned. Any upstream failure aborts the whole run.
pub async fn aggregate<S>(query: &KeywordQuery, source: &S) -> Result<AggregationResult>
where
    S: KeywordIdeaSource + ?Sized,
{
    let language_id = language_id(&query.language);
    let mut records: Vec<ResultRecord> = Vec::new();

    info!(
        "[KEYWORDS] fetching ideas for {} keywords in batches of {} (country={}, language={})",
        query.keywords.len(),
        KEYWORD_BATCH_SIZE,
        query.country,
        query.language,
    );

    'batches: for (idx, batch) in keyword_batches(&query.keywords).enumerate() {
        debug!("[KEYWORDS] batch {}: {} keywords", idx + 1, batch.len());

        let request = IdeaRequest {
            keywords: batch.to_vec(),
            geo_target_id: query.country.clone(),
            language_id: language_id.to_string(),
            page_size: None,
        };

        let mut page_token: Option<String> = None;
        loop {
            let page = source.fetch_page(&request, page_token.as_deref()).await?;

            for idea in page.ideas {
                let volume = idea.metrics.avg_monthly_searches.unwrap_or(0);
                if volume >= 0 && volume as u64 >= query.min_search_volume {
                    records.push(ResultRecord::from_idea(idea));
                }
                if records.len() >= query.max_results {
                    info!("[KEYWORDS] reached max keywords limit ({})", query.max_results);
                    break 'batches;
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
    }

    info!("[KEYWORDS] returning {} keywords", records.len());
    Ok(AggregationResult { records })
}

/// Fetch the first page of `request` with page size 1 and count at most one idea.
pub async fn probe<S>(request: &IdeaRequest, source: &S) -> Result<usize>
where
    S: KeywordIdeaSource + ?Sized,
{
    let request = IdeaRequest { page_size: Some(1), ..request.clone() };
    let page = source.fetch_page(&request, None).await?;
    Ok(page.ideas.len().min(1))
}
