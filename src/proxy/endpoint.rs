//! Proxy endpoint parsing.

use std::fmt;

use url::Url;

use crate::error_handling::ProxyError;

/// Username/password pair for an authenticated proxy.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One outbound proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

impl ProxyEndpoint {
    /// Parses `scheme://[user:pass@]host[:port]`.
    ///
    /// Supported schemes are `http`, `https`, `socks5` and `socks5h`. A
    /// missing port falls back to the scheme default (1080 for SOCKS).
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(raw.to_string(), e))?;
        let scheme = url.scheme().to_string();
        let default_port = match scheme.as_str() {
            "http" => 80,
            "https" => 443,
            "socks5" | "socks5h" => 1080,
            _ => return Err(ProxyError::UnsupportedScheme(scheme)),
        };
        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::MissingHost(raw.to_string()))?
            .to_string();
        let port = url.port().unwrap_or(default_port);
        let credentials = if url.username().is_empty() {
            None
        } else {
            Some(ProxyCredentials {
                username: url.username().to_string(),
                password: url.password().unwrap_or_default().to_string(),
            })
        };

        Ok(Self {
            scheme,
            host,
            port,
            credentials,
        })
    }

    /// Proxy URL without credentials.
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Builds the reqwest proxy routing all traffic through this endpoint.
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy, ProxyError> {
        let proxy = reqwest::Proxy::all(self.address())?;
        Ok(match &self.credentials {
            Some(creds) => proxy.basic_auth(&creds.username, &creds.password),
            None => proxy,
        })
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}
