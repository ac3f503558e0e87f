//! Authenticated identity data.

use std::fmt;

/// Credentials and fingerprint of one authenticated account.
///
/// Supplied by the embedding application. The cookie string is seeded into
/// the session's private jar; the remaining values are sent as headers on
/// every request.
#[derive(Clone, Default)]
pub struct Identity {
    /// Numeric account id; signed into every request and sent as `user-id`
    pub id: u64,
    /// Raw cookie header value (`name=value; name2=value2`)
    pub cookie: String,
    /// Browser User-Agent bound to the cookie (falls back to the config's)
    pub user_agent: Option<String>,
    /// Browser fingerprint header value (`x-bc`)
    pub x_bc: Option<String>,
    /// Bearer or platform token for the `authorization` header
    pub authorization: Option<String>,
}

impl Identity {
    pub fn new(id: u64, cookie: impl Into<String>) -> Self {
        Self {
            id,
            cookie: cookie.into(),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_x_bc(mut self, x_bc: impl Into<String>) -> Self {
        self.x_bc = Some(x_bc.into());
        self
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Individual `name=value` pairs of the cookie string.
    pub fn cookie_pairs(&self) -> impl Iterator<Item = &str> {
        self.cookie
            .split(';')
            .map(str::trim)
            .filter(|pair| pair.contains('='))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("cookie", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("x_bc", &self.x_bc.as_ref().map(|_| "<redacted>"))
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_pairs_skip_garbage() {
        let identity = Identity::new(7, "sess=abc; auth_id=7;  ; flag");
        let pairs: Vec<&str> = identity.cookie_pairs().collect();
        assert_eq!(pairs, vec!["sess=abc", "auth_id=7"]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let identity = Identity::new(7, "sess=topsecret").with_authorization("tok123");
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("tok123"));
        assert!(debug.contains("id: 7"));
    }
}
