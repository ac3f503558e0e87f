//! Sequential cursor pagination with an optional cutoff.

use super::engine::PaginationEngine;
use super::merge::{deep_merge, truncate_items};
use super::template::{TemplateVars, UrlTemplate};
use super::types::{AggregatedResult, IdKey, PageShape};
use crate::config::{DEFAULT_CURSOR_PARAM, DEFAULT_PAGE_LIMIT};
use crate::error_handling::PaginationError;

/// Parameters of a cursor pagination run.
#[derive(Debug, Clone)]
pub struct CursorRequest {
    /// Page template. When it has no `{cursor}` placeholder the cursor is
    /// appended as the `cursor_param` query parameter.
    pub template: UrlTemplate,
    pub identifier: Option<String>,
    pub limit: u64,
    /// Cursor of the first page (`None` starts at the newest item)
    pub cursor: Option<String>,
    /// Already-known item id: pagination stops at it, excluding it
    pub cutoff: Option<String>,
    /// Item id pointer, used for cursors and the cutoff
    pub id_key: IdKey,
    pub cursor_param: String,
    pub items_pointer: String,
}

impl CursorRequest {
    pub fn new(template: impl Into<UrlTemplate>) -> Self {
        Self {
            template: template.into(),
            identifier: None,
            limit: DEFAULT_PAGE_LIMIT,
            cursor: None,
            cutoff: None,
            id_key: IdKey::default(),
            cursor_param: DEFAULT_CURSOR_PARAM.to_string(),
            items_pointer: "/list".to_string(),
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn cutoff(mut self, cutoff: impl Into<String>) -> Self {
        self.cutoff = Some(cutoff.into());
        self
    }

    pub fn id_key(mut self, id_key: IdKey) -> Self {
        self.id_key = id_key;
        self
    }

    pub fn cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }

    pub fn items_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.items_pointer = pointer.into();
        self
    }
}

impl PaginationEngine {
    /// Fetches pages one after another, each starting after the previous
    /// page's last item.
    ///
    /// Continues while the endpoint reports more data. When an item whose id
    /// equals the cutoff appears, that item and everything after it are
    /// dropped and pagination stops with `cutoff_reached` set. A failed page
    /// ends pagination; items fetched before it are returned and the failure
    /// is listed.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError::InvalidUrl` if the template renders an
    /// invalid URL.
    pub async fn paginate_cursor(
        &self,
        request: &CursorRequest,
    ) -> Result<AggregatedResult, PaginationError> {
        let base = self.executor.manager().session().base_url().clone();
        let shape = PageShape {
            limit: request.limit,
            items_pointer: request.items_pointer.clone(),
            id_key: request.id_key.clone(),
        };
        let inline_cursor = request.template.has_placeholder("cursor");

        let mut result = AggregatedResult::default();
        let mut cursor = request.cursor.clone();

        loop {
            let vars = TemplateVars {
                identifier: request.identifier.as_deref(),
                offset: None,
                limit: Some(request.limit),
                cursor: cursor.as_deref(),
            };
            let mut url = request.template.render(&base, &vars)?;
            if let (false, Some(cursor)) = (inline_cursor, &cursor) {
                url.query_pairs_mut().append_pair(&request.cursor_param, cursor);
            }

            let mut page = match self.fetch_page(&url, &shape).await {
                Ok(page) => page,
                Err(e) => {
                    result
                        .failures
                        .push(self.record_failure(&url, None, cursor.clone(), &e));
                    result.has_more = false;
                    break;
                }
            };
            result.pages_fetched += 1;

            let cutoff_at = request.cutoff.as_deref().and_then(|cutoff| {
                page.items
                    .iter()
                    .position(|item| request.id_key.extract_string(item).as_deref() == Some(cutoff))
            });
            if let Some(position) = cutoff_at {
                log::debug!("Cutoff reached at position {} of page {}", position, url);
                page.items.truncate(position);
                truncate_items(&mut page.payload, &request.items_pointer, position);
                result.items.extend(page.items);
                deep_merge(&mut result.payload, page.payload);
                result.has_more = false;
                result.cutoff_reached = true;
                break;
            }

            result.items.extend(page.items);
            deep_merge(&mut result.payload, page.payload);
            result.has_more = page.has_more;

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        log::info!(
            "Cursor pagination of {} finished: {} item(s) from {} page(s){}",
            request.template.as_str(),
            result.items.len(),
            result.pages_fetched,
            if result.cutoff_reached {
                ", stopped at cutoff"
            } else {
                ""
            }
        );
        Ok(result)
    }
}
