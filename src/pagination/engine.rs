//! Pagination engine handle and single-page fetch.

use reqwest::Method;
use url::Url;

use super::types::{Envelope, PageFailure, PageResult, PageShape};
use crate::concurrency::WorkerPool;
use crate::error_handling::{InfoType, RequestError};
use crate::request::RequestExecutor;

/// Reconstructs full result sets from paginated endpoints.
///
/// Two strategies: speculative waves over offset endpoints
/// (`paginate_waves`) and sequential cursor pagination (`paginate_cursor`).
/// Both degrade a failed page to "no more data" and report it in
/// `AggregatedResult::failures`.
#[derive(Clone)]
pub struct PaginationEngine {
    pub(super) executor: RequestExecutor,
    pub(super) workers: WorkerPool,
}

impl PaginationEngine {
    pub fn new(executor: RequestExecutor, workers: WorkerPool) -> Self {
        Self { executor, workers }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Fetches and decodes one page.
    pub async fn fetch_page(&self, url: &Url, shape: &PageShape) -> Result<PageResult, RequestError> {
        let envelope: Envelope = self.executor.json_request(url, Method::GET, None).await?;
        envelope.into_page(shape).map_err(RequestError::Api)
    }

    pub(super) fn record_failure(
        &self,
        url: &Url,
        offset: Option<u64>,
        cursor: Option<String>,
        error: &RequestError,
    ) -> PageFailure {
        log::warn!(
            "Page {} failed, treating it as the last page: {}",
            url,
            error
        );
        self.executor
            .manager()
            .stats()
            .increment_info(InfoType::PageFailedDegraded);
        PageFailure {
            url: url.to_string(),
            offset,
            cursor,
            error: error.to_string(),
        }
    }
}
