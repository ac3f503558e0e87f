//! Page envelopes, results and item decoding.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::merge::items_at;
use crate::error_handling::ApiError;
use crate::request::ErrorBody;

/// JSON pointer locating an item's identifier (default `/id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdKey(pub String);

impl Default for IdKey {
    fn default() -> Self {
        Self("/id".to_string())
    }
}

impl IdKey {
    pub fn new(pointer: impl Into<String>) -> Self {
        Self(pointer.into())
    }

    pub fn extract<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        item.pointer(&self.0)
    }

    /// The id as text: strings as-is, numbers in decimal.
    pub fn extract_string(&self, item: &Value) -> Option<String> {
        match self.extract(item)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Sort applied to the flattened items after a wave pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub key: IdKey,
    pub descending: bool,
}

impl SortOrder {
    /// Descending by `/id`.
    pub fn by_id_descending() -> Self {
        Self {
            key: IdKey::default(),
            descending: true,
        }
    }
}

/// Accessory collection to fold into items (referenced account stubs,
/// last-message stubs and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryLink {
    /// Pointer to the collection in the merged payload
    pub collection: String,
    /// Pointer to the stub inside each item
    pub stub: String,
    /// Id pointer, applied to both stubs and collection records
    pub key: IdKey,
}

/// Response body shapes a page endpoint may return.
///
/// Variant order matters: arrays must be tried before the struct variants,
/// which serde would otherwise also accept from a sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Bare array of items
    Items(Vec<Value>),
    /// `{"error": {"code": .., "message": ..}}`
    Error { error: ErrorBody },
    /// `{"list": [...], "hasMore": bool, ...}`
    List {
        list: Vec<Value>,
        #[serde(rename = "hasMore", default)]
        has_more: bool,
        #[serde(flatten)]
        rest: Map<String, Value>,
    },
    /// `{"response": ...}`
    Response { response: Value },
    /// Any other JSON value
    Other(Value),
}

/// How to read items out of a page.
#[derive(Debug, Clone)]
pub struct PageShape {
    pub limit: u64,
    pub items_pointer: String,
    pub id_key: IdKey,
}

impl Envelope {
    /// Normalizes the envelope into a page.
    ///
    /// `has_more` comes from an explicit `hasMore` flag when present. A bare
    /// array has no flag, so it counts as having more when it is full.
    ///
    /// # Errors
    ///
    /// Returns the decoded `ApiError` for an error envelope.
    pub fn into_page(self, shape: &PageShape) -> Result<PageResult, ApiError> {
        let payload = match self {
            Envelope::Error { error } => return Err(error.into_api_error(StatusCode::OK)),
            Envelope::List {
                list,
                has_more,
                mut rest,
            } => {
                rest.insert("list".to_string(), Value::Array(list));
                rest.insert("hasMore".to_string(), Value::Bool(has_more));
                Value::Object(rest)
            }
            Envelope::Response { response } => response,
            Envelope::Items(items) => Value::Array(items),
            Envelope::Other(value) => value,
        };

        let items = items_at(&payload, &shape.items_pointer);
        let has_more = match payload.get("hasMore").and_then(Value::as_bool) {
            Some(flag) => flag,
            None => payload.is_array() && items.len() as u64 >= shape.limit,
        };
        let next_cursor = items.last().and_then(|item| shape.id_key.extract_string(item));

        Ok(PageResult {
            payload,
            items,
            has_more,
            next_cursor,
        })
    }
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Page content (the `response` value, the list object, or the array)
    pub payload: Value,
    /// Items found in the payload
    pub items: Vec<Value>,
    pub has_more: bool,
    /// Id of the last item, used as the cursor for the next page
    pub next_cursor: Option<String>,
}

/// A page that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    /// Offset of the page (wave pagination)
    pub offset: Option<u64>,
    /// Cursor of the page (cursor pagination)
    pub cursor: Option<String>,
    pub error: String,
}

/// Result of a full pagination run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    /// Every page payload, deep-merged in fetch order
    pub payload: Value,
    /// Flattened items, linked and sorted when requested
    pub items: Vec<Value>,
    /// Whether the endpoint reported more data after the last page read
    pub has_more: bool,
    pub pages_fetched: usize,
    /// Pages that failed; each was treated as empty with no more data
    pub failures: Vec<PageFailure>,
    /// Cursor pagination stopped at the caller's cutoff id
    pub cutoff_reached: bool,
}

impl AggregatedResult {
    /// True when no page failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Items decoded by their `responseType`.
    pub fn tagged_items(&self) -> Vec<TaggedItem> {
        self.items.iter().cloned().map(TaggedItem::from_value).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostItem {
    pub id: u64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "postedAt", default)]
    pub posted_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageItem {
    pub id: u64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "fromUser", default)]
    pub from_user: Option<Value>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatItem {
    #[serde(rename = "withUser")]
    pub with_user: Value,
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(tag = "responseType", rename_all = "lowercase")]
enum KnownItem {
    Post(PostItem),
    Message(MessageItem),
    Chat(ChatItem),
}

/// A page item discriminated by its `responseType` field.
///
/// Unknown kinds, and known kinds that do not match their record shape,
/// are kept as raw values.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedItem {
    Post(PostItem),
    Message(MessageItem),
    Chat(ChatItem),
    Unknown(Value),
}

impl TaggedItem {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<KnownItem>(value.clone()) {
            Ok(KnownItem::Post(post)) => TaggedItem::Post(post),
            Ok(KnownItem::Message(message)) => TaggedItem::Message(message),
            Ok(KnownItem::Chat(chat)) => TaggedItem::Chat(chat),
            Err(_) => TaggedItem::Unknown(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shape(limit: u64) -> PageShape {
        PageShape {
            limit,
            items_pointer: "/list".to_string(),
            id_key: IdKey::default(),
        }
    }

    fn decode(body: Value) -> Envelope {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_list_envelope_keeps_accessories() {
        let page = decode(json!({
            "list": [{"id": 1}, {"id": 2}],
            "hasMore": true,
            "accounts": [{"id": 9}]
        }))
        .into_page(&shape(10))
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
        assert_eq!(page.payload["accounts"][0]["id"], 9);
    }

    #[test]
    fn test_list_envelope_without_flag() {
        let page = decode(json!({"list": [{"id": 1}]}))
            .into_page(&shape(1))
            .unwrap();
        assert!(!page.has_more);
    }

    #[test]
    fn test_response_envelope() {
        let page = decode(json!({"response": {"list": [{"id": "a"}], "hasMore": false}}))
            .into_page(&shape(10))
            .unwrap();
        assert_eq!(page.items, vec![json!({"id": "a"})]);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("a"));
    }

    #[test]
    fn test_bare_array_has_more_when_full() {
        let full = decode(json!([{"id": 1}, {"id": 2}])).into_page(&shape(2)).unwrap();
        assert!(full.has_more);
        let short = decode(json!([{"id": 1}])).into_page(&shape(2)).unwrap();
        assert!(!short.has_more);
    }

    #[test]
    fn test_error_envelope() {
        let err = decode(json!({"error": {"code": 0, "message": "Not allowed"}}))
            .into_page(&shape(10))
            .unwrap_err();
        assert_eq!(err, ApiError::new(0, "Not allowed"));
    }

    #[test]
    fn test_id_key_custom_pointer() {
        let key = IdKey::new("/author/id");
        assert_eq!(
            key.extract_string(&json!({"author": {"id": 77}})).as_deref(),
            Some("77")
        );
        assert!(key.extract_string(&json!({"author": {}})).is_none());
    }

    #[test]
    fn test_tagged_items() {
        let post = TaggedItem::from_value(json!({"responseType": "post", "id": 1, "text": "hi"}));
        assert!(matches!(post, TaggedItem::Post(ref p) if p.id == 1 && p.text.as_deref() == Some("hi")));

        let chat = TaggedItem::from_value(json!({"responseType": "chat", "withUser": {"id": 5}}));
        assert!(matches!(chat, TaggedItem::Chat(ref c) if c.with_user["id"] == 5));

        let message =
            TaggedItem::from_value(json!({"responseType": "message", "id": 3, "fromUser": {"id": 2}}));
        assert!(matches!(message, TaggedItem::Message(ref m) if m.id == 3));

        let story = json!({"responseType": "story", "id": 4});
        assert_eq!(TaggedItem::from_value(story.clone()), TaggedItem::Unknown(story));
    }
}
