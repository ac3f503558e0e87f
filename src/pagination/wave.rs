//! Speculative wave pagination over offset endpoints.
//!
//! Total size is unknown, so each wave fetches the next `multiplier` pages
//! concurrently before knowing whether they exist. Wave `d` (starting at 1)
//! covers pages `(d-1)*M .. d*M` from the base offset. The page at the
//! highest offset decides whether another wave runs.

use futures::future::join_all;

use super::engine::PaginationEngine;
use super::merge::{items_at, link_accessories, merge_all, sort_items};
use super::template::{TemplateVars, UrlTemplate};
use super::types::{AccessoryLink, AggregatedResult, IdKey, PageResult, PageShape, SortOrder};
use crate::config::{default_parallelism, DEFAULT_PAGE_LIMIT};
use crate::error_handling::PaginationError;

/// Offsets fetched by the wave at `depth`: the last `multiplier` of
/// `offset + k * limit` for `k` in `0..multiplier * depth`.
///
/// At most `multiplier` offsets, strictly increasing when `limit > 0`, all
/// below `offset + multiplier * depth * limit`.
pub fn wave_offsets(offset: u64, limit: u64, multiplier: usize, depth: usize) -> Vec<u64> {
    let end = multiplier.saturating_mul(depth);
    let start = end.saturating_sub(multiplier);
    (start..end)
        .map(|k| offset.saturating_add((k as u64).saturating_mul(limit)))
        .collect()
}

/// Parameters of a wave pagination run.
#[derive(Debug, Clone)]
pub struct WaveRequest {
    /// Template with `{offset}` and `{limit}` (and optionally `{identifier}`)
    pub template: UrlTemplate,
    pub identifier: Option<String>,
    /// Base offset; stays fixed while the waves advance
    pub offset: u64,
    /// Page size
    pub limit: u64,
    /// Pages fetched concurrently per wave
    pub multiplier: usize,
    /// Where items sit in an object payload
    pub items_pointer: String,
    /// Accessory collections folded into items after merging
    pub links: Vec<AccessoryLink>,
    /// Final ordering of the flattened items (`None` keeps offset order)
    pub sort: Option<SortOrder>,
}

impl WaveRequest {
    /// Offset 0, default page size, one page per hardware thread per wave,
    /// items under `/list`, sorted by descending id.
    pub fn new(template: impl Into<UrlTemplate>) -> Self {
        Self {
            template: template.into(),
            identifier: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
            multiplier: default_parallelism(),
            items_pointer: "/list".to_string(),
            links: Vec::new(),
            sort: Some(SortOrder::by_id_descending()),
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn multiplier(mut self, multiplier: usize) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn items_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.items_pointer = pointer.into();
        self
    }

    pub fn link(mut self, link: AccessoryLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn sort(mut self, sort: Option<SortOrder>) -> Self {
        self.sort = sort;
        self
    }
}

impl PaginationEngine {
    /// Fetches every page of an offset endpoint in concurrent waves.
    ///
    /// Each wave is a barrier: all of its pages are awaited and failures are
    /// collected per page. A failed page counts as empty with no more data,
    /// so a failure at the frontier ends pagination; the failure is listed in
    /// the result. Pages are merged in offset order; accessory links and the
    /// final sort run once on the worker pool.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError` for a zero limit or multiplier, a template
    /// that renders an invalid URL, or a worker failure. Page fetch errors
    /// are not errors of the run.
    pub async fn paginate_waves(
        &self,
        request: &WaveRequest,
    ) -> Result<AggregatedResult, PaginationError> {
        if request.limit == 0 || request.multiplier == 0 {
            return Err(PaginationError::InvalidWave {
                limit: request.limit,
                multiplier: request.multiplier,
            });
        }

        let base = self.executor.manager().session().base_url().clone();
        let shape = PageShape {
            limit: request.limit,
            items_pointer: request.items_pointer.clone(),
            id_key: IdKey::default(),
        };

        let mut pages: Vec<(u64, PageResult)> = Vec::new();
        let mut failures = Vec::new();
        let mut depth = 1;

        let has_more = loop {
            let offsets = wave_offsets(request.offset, request.limit, request.multiplier, depth);
            let frontier = offsets.last().copied();
            let targets = offsets
                .into_iter()
                .map(|offset| {
                    let vars = TemplateVars {
                        identifier: request.identifier.as_deref(),
                        offset: Some(offset),
                        limit: Some(request.limit),
                        cursor: None,
                    };
                    request.template.render(&base, &vars).map(|url| (offset, url))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let outcomes = join_all(targets.iter().map(|(offset, url)| {
                let shape = &shape;
                async move { (*offset, url, self.fetch_page(url, shape).await) }
            }))
            .await;

            let mut frontier_more = false;
            for (offset, url, outcome) in outcomes {
                match outcome {
                    Ok(page) => {
                        if Some(offset) == frontier {
                            frontier_more = page.has_more;
                        }
                        pages.push((offset, page));
                    }
                    Err(e) => failures.push(self.record_failure(url, Some(offset), None, &e)),
                }
            }

            log::debug!(
                "Wave {} done: {} page(s) so far, frontier {:?} has_more={}",
                depth,
                pages.len(),
                frontier,
                frontier_more
            );
            if !frontier_more {
                break frontier_more;
            }
            depth += 1;
        };

        let pages_fetched = pages.len();
        pages.sort_by_key(|(offset, _)| *offset);
        let items_pointer = request.items_pointer.clone();
        let links = request.links.clone();
        let sort = request.sort.clone();

        let (payload, items) = self
            .workers
            .run(move || {
                let payload = merge_all(pages.into_iter().map(|(_, page)| page.payload));
                let mut items = items_at(&payload, &items_pointer);
                for link in &links {
                    let linked = link_accessories(&mut items, &payload, link);
                    log::debug!("Linked {} item(s) from {}", linked, link.collection);
                }
                if let Some(order) = &sort {
                    sort_items(&mut items, order);
                }
                (payload, items)
            })
            .await?;

        log::info!(
            "Wave pagination of {} finished: {} item(s) from {} page(s), {} failure(s)",
            request.template.as_str(),
            items.len(),
            pages_fetched,
            failures.len()
        );

        Ok(AggregatedResult {
            payload,
            items,
            has_more,
            pages_fetched,
            failures,
            cutoff_reached: false,
        })
    }
}
