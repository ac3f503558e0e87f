//! Additive deep merge and the post-merge link/sort steps.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use super::types::{AccessoryLink, SortOrder};

/// Merges `incoming` into `base`.
///
/// Objects merge key by key, arrays concatenate (base first), and any other
/// combination is last-write-wins.
pub fn deep_merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(incoming)) => base.extend(incoming),
        (base, incoming) => *base = incoming,
    }
}

/// Merges every payload in order into one value.
pub fn merge_all(payloads: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for payload in payloads {
        deep_merge(&mut merged, payload);
    }
    merged
}

/// Replaces each item's stub at `link.stub` with the full record of the same
/// id from the accessory collection at `link.collection` in `payload`.
///
/// The collection may be an array of records (ids read with `link.key`) or
/// an object keyed by id. Stub fields missing from the record are kept.
/// Returns the number of stubs linked.
pub fn link_accessories(items: &mut [Value], payload: &Value, link: &AccessoryLink) -> usize {
    let records: HashMap<String, &Value> = match payload.pointer(&link.collection) {
        Some(Value::Array(records)) => records
            .iter()
            .filter_map(|record| link.key.extract_string(record).map(|id| (id, record)))
            .collect(),
        Some(Value::Object(records)) => records.iter().map(|(id, r)| (id.clone(), r)).collect(),
        _ => return 0,
    };

    let mut linked = 0;
    for item in items.iter_mut() {
        let Some(stub) = item.pointer_mut(&link.stub) else {
            continue;
        };
        let Some(record) = link
            .key
            .extract_string(stub)
            .and_then(|id| records.get(&id))
        else {
            continue;
        };
        match (stub, record) {
            (Value::Object(stub), Value::Object(record)) => {
                for (key, value) in record {
                    stub.insert(key.clone(), value.clone());
                }
            }
            (stub, record) => *stub = (*record).clone(),
        }
        linked += 1;
    }
    linked
}

/// Stable sort of `items` by the value at `order.key`.
///
/// Numbers compare numerically and strings lexically; items without the key
/// sort before items with it (after, when descending).
pub fn sort_items(items: &mut [Value], order: &SortOrder) {
    items.sort_by(|a, b| {
        let ordering = compare_keys(order.key.extract(a), order.key.extract(b));
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Items of a page or merged payload: the payload itself when it is an
/// array, else the array at `pointer`.
pub fn items_at(payload: &Value, pointer: &str) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        other => other
            .pointer(pointer)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

/// Truncates the item array of `payload` (see `items_at`) to `len`.
pub fn truncate_items(payload: &mut Value, pointer: &str, len: usize) {
    let items = match payload {
        Value::Array(items) => Some(items),
        other => other.pointer_mut(pointer).and_then(Value::as_array_mut),
    };
    if let Some(items) = items {
        items.truncate(len);
    }
}
