//! Per-request header composition.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, REFERER};
use url::Url;

use crate::config::{
    ACCEPT_JSON, HEADER_APP_TOKEN, HEADER_AUTHORIZATION, HEADER_SIGN, HEADER_TIME,
    HEADER_USER_ID, HEADER_X_BC,
};
use crate::error_handling::RequestError;
use crate::session::Identity;
use crate::signing::{sign, DynamicRuleSet};

/// Builds the full header set for one attempt.
///
/// Signs the URL at `timestamp_ms`, adds the static headers and the
/// identity's headers, then strips every name listed in the rule set's
/// `remove_headers`. Cookies are not included here: the client attaches the
/// session jar's cookies at send time.
pub fn compose_headers(
    url: &Url,
    referer: &Url,
    identity: &Identity,
    rules: &DynamicRuleSet,
    timestamp_ms: i64,
) -> Result<HeaderMap, RequestError> {
    let signed = sign(url, identity.id, timestamp_ms, rules)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
    insert(&mut headers, REFERER.as_str(), referer.as_str())?;
    insert(&mut headers, HEADER_SIGN, &signed.sign)?;
    insert(&mut headers, HEADER_TIME, &signed.time)?;
    insert(&mut headers, HEADER_USER_ID, &identity.id.to_string())?;
    if let Some(app_token) = &rules.app_token {
        insert(&mut headers, HEADER_APP_TOKEN, app_token)?;
    }
    if let Some(x_bc) = &identity.x_bc {
        insert(&mut headers, HEADER_X_BC, x_bc)?;
    }
    if let Some(authorization) = &identity.authorization {
        insert(&mut headers, HEADER_AUTHORIZATION, authorization)?;
    }

    for name in &rules.remove_headers {
        if let Ok(name) = HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes()) {
            headers.remove(name);
        }
    }

    Ok(headers)
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), RequestError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
    let value =
        HeaderValue::from_str(value).map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DynamicRuleSet {
        DynamicRuleSet {
            static_param: "9pGMwAMvbYZiPNt3pNNxGk6wyGOS7IJq".to_string(),
            format: "20:{}:{:x}:64f1b3ab".to_string(),
            checksum_indexes: vec![1, 5, 9, 14, 22, 31, 38],
            checksum_constant: -1127,
            app_token: Some("33d57ade8c02dbc5a333db99ff9ae26a".to_string()),
            remove_headers: Vec::new(),
        }
    }

    fn urls() -> (Url, Url) {
        (
            Url::parse("https://api.example.com/api2/v2/users/me?limit=10").unwrap(),
            Url::parse("https://api.example.com/").unwrap(),
        )
    }

    #[test]
    fn test_compose_full_header_set() {
        let (url, referer) = urls();
        let identity = Identity::new(12345, "sess=abc")
            .with_x_bc("fingerprint")
            .with_authorization("Bearer tok");
        let headers =
            compose_headers(&url, &referer, &identity, &rules(), 1_700_000_000_000).unwrap();

        assert_eq!(
            headers[HEADER_SIGN],
            "20:c98eb3fd539f4fb26a127266ba33e8d93f277230:2c4:64f1b3ab"
        );
        assert_eq!(headers[HEADER_TIME], "1700000000000");
        assert_eq!(headers[HEADER_USER_ID], "12345");
        assert_eq!(headers[HEADER_APP_TOKEN], "33d57ade8c02dbc5a333db99ff9ae26a");
        assert_eq!(headers[HEADER_X_BC], "fingerprint");
        assert_eq!(headers[HEADER_AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[REFERER], "https://api.example.com/");
        assert_eq!(headers[ACCEPT], ACCEPT_JSON);
    }

    #[test]
    fn test_optional_headers_absent() {
        let (url, referer) = urls();
        let mut rules = rules();
        rules.app_token = None;
        let headers =
            compose_headers(&url, &referer, &Identity::new(1, ""), &rules, 0).unwrap();
        assert!(!headers.contains_key(HEADER_APP_TOKEN));
        assert!(!headers.contains_key(HEADER_X_BC));
        assert!(!headers.contains_key(HEADER_AUTHORIZATION));
    }

    #[test]
    fn test_remove_headers_case_insensitive() {
        let (url, referer) = urls();
        let mut rules = rules();
        rules.remove_headers = vec!["User-Id".to_string(), "App-Token".to_string()];
        let headers =
            compose_headers(&url, &referer, &Identity::new(1, ""), &rules, 0).unwrap();
        assert!(!headers.contains_key(HEADER_USER_ID));
        assert!(!headers.contains_key(HEADER_APP_TOKEN));
        assert!(headers.contains_key(HEADER_SIGN));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let (url, referer) = urls();
        let identity = Identity::new(1, "").with_x_bc("bad\nvalue");
        let result = compose_headers(&url, &referer, &identity, &rules(), 0);
        assert!(matches!(result, Err(RequestError::InvalidHeader(name)) if name == HEADER_X_BC));
    }
}
