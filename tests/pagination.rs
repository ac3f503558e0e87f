// Integration tests for wave and cursor pagination against a mock server.

mod helpers;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::{json, Value};
use signed_pager::error_handling::InfoType;
use signed_pager::pagination::{AccessoryLink, CursorRequest, IdKey, WaveRequest};

use helpers::test_manager;

const POSTS: &str = "/api2/v2/users/{identifier}/posts?limit={limit}&offset={offset}";
const MESSAGES: &str = "/api2/v2/chats/{identifier}/messages?limit={limit}&order=desc";

/// Items with ids `from` down to `to`, newest first.
fn items(from: u64, to: u64) -> Vec<Value> {
    (to..=from).rev().map(|id| json!({"id": id})).collect()
}

fn page(items: Vec<Value>, has_more: bool) -> Value {
    json!({"list": items, "hasMore": has_more})
}

fn expect_offset(server: &Server, offset: &'static str, body: Value) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api2/v2/users/42/posts"),
            request::query(url_decoded(contains(("offset", offset)))),
        ])
        .respond_with(json_encoded(body)),
    );
}

fn ids(items: &[Value]) -> Vec<u64> {
    items.iter().filter_map(|item| item["id"].as_u64()).collect()
}

#[tokio::test]
async fn test_wave_single_page_per_wave_collects_everything() {
    let server = Server::run();
    expect_offset(&server, "0", page(items(23, 14), true));
    expect_offset(&server, "10", page(items(13, 4), true));
    expect_offset(&server, "20", page(items(3, 1), false));

    let manager = test_manager(&server);
    let request = WaveRequest::new(POSTS)
        .identifier("42")
        .limit(10)
        .multiplier(1);
    let result = manager.pagination().paginate_waves(&request).await.unwrap();

    assert_eq!(result.pages_fetched, 3);
    assert!(!result.has_more);
    assert!(result.is_complete());
    assert_eq!(result.items.len(), 23);
    assert_eq!(ids(&result.items)[0], 23);
    assert_eq!(ids(&result.items)[22], 1);
    assert_eq!(result.payload["list"].as_array().unwrap().len(), 23);
    assert_eq!(result.payload["hasMore"], false);
}

#[tokio::test]
async fn test_wave_stops_when_frontier_page_is_empty() {
    let server = Server::run();
    expect_offset(&server, "0", page(items(25, 16), true));
    expect_offset(&server, "10", page(items(15, 6), true));
    expect_offset(&server, "20", page(items(5, 1), false));
    expect_offset(&server, "30", page(Vec::new(), false));

    let manager = test_manager(&server);
    let request = WaveRequest::new(POSTS)
        .identifier("42")
        .limit(10)
        .multiplier(2);
    let result = manager.pagination().paginate_waves(&request).await.unwrap();

    assert_eq!(result.pages_fetched, 4);
    assert_eq!(result.items.len(), 25);
    assert!(!result.has_more);
    let sorted = ids(&result.items);
    assert!(sorted.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn test_wave_failed_page_is_reported_not_fatal() {
    let server = Server::run();
    expect_offset(&server, "0", page(items(20, 11), true));
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api2/v2/users/42/posts"),
            request::query(url_decoded(contains(("offset", "10")))),
        ])
        .respond_with(status_code(404).body(r#"{"error":{"code":0,"message":"Not found"}}"#)),
    );

    let manager = test_manager(&server);
    let request = WaveRequest::new(POSTS)
        .identifier("42")
        .limit(10)
        .multiplier(2);
    let result = manager.pagination().paginate_waves(&request).await.unwrap();

    assert_eq!(result.items.len(), 10);
    assert_eq!(result.pages_fetched, 1);
    assert!(!result.has_more);
    assert!(!result.is_complete());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].offset, Some(10));
    assert!(result.failures[0].error.contains("Not found"));
    assert_eq!(
        manager.stats().get_info_count(InfoType::PageFailedDegraded),
        1
    );
}

#[tokio::test]
async fn test_wave_links_accessory_records() {
    let server = Server::run();
    expect_offset(
        &server,
        "0",
        json!({
            "list": [
                {"id": 2, "author": {"id": 9}},
                {"id": 1, "author": {"id": 8}}
            ],
            "hasMore": false,
            "accounts": [{"id": 9, "name": "Nine"}]
        }),
    );

    let manager = test_manager(&server);
    let request = WaveRequest::new(POSTS)
        .identifier("42")
        .limit(10)
        .multiplier(1)
        .link(AccessoryLink {
            collection: "/accounts".to_string(),
            stub: "/author".to_string(),
            key: IdKey::default(),
        });
    let result = manager.pagination().paginate_waves(&request).await.unwrap();

    assert_eq!(result.items[0]["author"]["name"], "Nine");
    assert_eq!(result.items[1]["author"], json!({"id": 8}));
}

#[tokio::test]
async fn test_wave_rejects_zero_multiplier() {
    let server = Server::run();
    let manager = test_manager(&server);
    let request = WaveRequest::new(POSTS).identifier("42").multiplier(0);
    assert!(manager.pagination().paginate_waves(&request).await.is_err());
}

fn expect_first_cursor_page(server: &Server, body: Value) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api2/v2/chats/5/messages"),
            request::query(url_decoded(not(contains(key("id"))))),
        ])
        .respond_with(json_encoded(body)),
    );
}

fn expect_cursor(server: &Server, cursor: &'static str, body: Value) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api2/v2/chats/5/messages"),
            request::query(url_decoded(contains(("id", cursor)))),
        ])
        .respond_with(json_encoded(body)),
    );
}

#[tokio::test]
async fn test_cursor_runs_until_no_more() {
    let server = Server::run();
    expect_first_cursor_page(&server, page(items(30, 27), true));
    expect_cursor(&server, "27", page(items(26, 23), true));
    expect_cursor(&server, "23", page(items(22, 21), false));

    let manager = test_manager(&server);
    let request = CursorRequest::new(MESSAGES).identifier("5").limit(4);
    let result = manager.pagination().paginate_cursor(&request).await.unwrap();

    assert_eq!(result.pages_fetched, 3);
    assert_eq!(ids(&result.items), (21..=30).rev().collect::<Vec<_>>());
    assert!(!result.has_more);
    assert!(!result.cutoff_reached);
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_cursor_stops_at_cutoff() {
    let server = Server::run();
    expect_first_cursor_page(&server, page(items(30, 27), true));
    expect_cursor(&server, "27", page(items(26, 23), true));

    let manager = test_manager(&server);
    let request = CursorRequest::new(MESSAGES)
        .identifier("5")
        .limit(4)
        .cutoff("26");
    let result = manager.pagination().paginate_cursor(&request).await.unwrap();

    assert_eq!(ids(&result.items), vec![30, 29, 28, 27]);
    assert_eq!(result.pages_fetched, 2);
    assert!(result.cutoff_reached);
    assert!(!result.has_more);
    assert_eq!(result.payload["list"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_cursor_cutoff_mid_page_keeps_newer_items() {
    let server = Server::run();
    expect_first_cursor_page(&server, page(items(30, 27), true));

    let manager = test_manager(&server);
    let request = CursorRequest::new(MESSAGES)
        .identifier("5")
        .limit(4)
        .cutoff("28");
    let result = manager.pagination().paginate_cursor(&request).await.unwrap();

    assert_eq!(ids(&result.items), vec![30, 29]);
    assert_eq!(result.pages_fetched, 1);
    assert!(result.cutoff_reached);
}

#[tokio::test]
async fn test_cursor_error_keeps_partial_results() {
    let server = Server::run();
    expect_first_cursor_page(&server, page(items(30, 27), true));
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api2/v2/chats/5/messages"),
            request::query(url_decoded(contains(("id", "27")))),
        ])
        .respond_with(status_code(403).body(r#"{"error":{"code":0,"message":"Access denied"}}"#)),
    );

    let manager = test_manager(&server);
    let request = CursorRequest::new(MESSAGES).identifier("5").limit(4);
    let result = manager.pagination().paginate_cursor(&request).await.unwrap();

    assert_eq!(ids(&result.items), vec![30, 29, 28, 27]);
    assert_eq!(result.pages_fetched, 1);
    assert!(!result.has_more);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].cursor.as_deref(), Some("27"));
}
