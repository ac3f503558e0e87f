//! Page URL templates.

use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::error_handling::PaginationError;

/// URL template with `{identifier}`, `{offset}`, `{limit}` and `{cursor}`
/// placeholders.
///
/// Templates may be absolute or relative to the session's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

/// Values substituted into a `UrlTemplate`. Absent values render as empty;
/// `identifier` and `cursor` are percent-encoded.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars<'a> {
    pub identifier: Option<&'a str>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub cursor: Option<&'a str>,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template contains `{name}`.
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.0.contains(&format!("{{{}}}", name))
    }

    /// Substitutes `vars` and resolves the result against `base`.
    ///
    /// # Errors
    ///
    /// Returns `PaginationError::InvalidUrl` if the rendered text is not a
    /// valid URL.
    pub fn render(&self, base: &Url, vars: &TemplateVars<'_>) -> Result<Url, PaginationError> {
        let offset = vars.offset.map(|o| o.to_string()).unwrap_or_default();
        let limit = vars.limit.map(|l| l.to_string()).unwrap_or_default();
        let rendered = self
            .0
            .replace("{identifier}", &encode(vars.identifier))
            .replace("{offset}", &offset)
            .replace("{limit}", &limit)
            .replace("{cursor}", &encode(vars.cursor));

        base.join(&rendered)
            .map_err(|source| PaginationError::InvalidUrl {
                url: rendered,
                source,
            })
    }
}

/// Percent-encodes a value for either a path segment or a query value.
fn encode(value: Option<&str>) -> String {
    // Literal '+' is already %2B, so the form encoding's '+' is always a space.
    byte_serialize(value.unwrap_or_default().as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl From<&str> for UrlTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for UrlTemplate {
    fn from(template: String) -> Self {
        Self(template)
    }
}
