//! Result-set reconstruction from paginated endpoints.
//!
//! This module handles:
//! - URL templates for offset and cursor pages
//! - Typed decoding of the platform's page envelopes
//! - Speculative wave pagination for offset endpoints of unknown length
//! - Sequential cursor pagination with an optional cutoff id
//! - Additive deep merge of page payloads, accessory linking and sorting

mod cursor;
mod engine;
mod merge;
mod template;
mod types;
mod wave;

pub use cursor::CursorRequest;
pub use engine::PaginationEngine;
pub use merge::{deep_merge, items_at, link_accessories, merge_all, sort_items};
pub use template::{TemplateVars, UrlTemplate};
pub use types::{
    AccessoryLink, AggregatedResult, ChatItem, Envelope, IdKey, MessageItem, PageFailure,
    PageResult, PageShape, PostItem, SortOrder, TaggedItem,
};
pub use wave::{wave_offsets, WaveRequest};
