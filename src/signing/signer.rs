//! Request signature computation.

use sha1::{Digest, Sha1};
use url::Url;

use super::rules::DynamicRuleSet;
use crate::error_handling::SigningError;

/// Headers produced by signing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value of the `sign` header
    pub sign: String,
    /// Value of the `time` header (milliseconds, as sent)
    pub time: String,
}

/// Computes the signature headers for a request.
///
/// The signed message is the rule set's static parameter, the timestamp,
/// the URL's path and query, and the identity id, joined by newlines. The
/// lowercase hex SHA-1 of that message is combined with a checksum (sum of
/// the ASCII values of selected digest characters plus a constant) through
/// the rule set's format string.
///
/// Deterministic: identical inputs always produce identical headers.
pub fn sign(
    url: &Url,
    identity_id: u64,
    timestamp_ms: i64,
    rules: &DynamicRuleSet,
) -> Result<SignedHeaders, SigningError> {
    let time = timestamp_ms.to_string();
    let path = path_and_query(url);
    let message = [
        rules.static_param.as_str(),
        time.as_str(),
        path.as_str(),
        &identity_id.to_string(),
    ]
    .join("\n");

    let digest = hex::encode(Sha1::digest(message.as_bytes()));
    let checksum = checksum(&digest, &rules.checksum_indexes, rules.checksum_constant)?;
    let sign = apply_format(&rules.format, &digest, checksum.unsigned_abs())?;

    Ok(SignedHeaders { sign, time })
}

/// Path plus `?query` when the URL has one.
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn checksum(digest: &str, indexes: &[usize], constant: i64) -> Result<i64, SigningError> {
    let bytes = digest.as_bytes();
    let mut sum: i64 = 0;
    for &index in indexes {
        let byte = bytes
            .get(index)
            .ok_or(SigningError::ChecksumIndexOutOfRange {
                index,
                len: bytes.len(),
            })?;
        sum = sum
            .checked_add(i64::from(*byte))
            .ok_or(SigningError::ChecksumOverflow { constant })?;
    }
    sum.checked_add(constant)
        .ok_or(SigningError::ChecksumOverflow { constant })
}

/// Applies a brace-style format string to the digest and checksum.
///
/// Supported fields: `{}` (next argument), `{0}`/`{1}` (explicit argument),
/// each optionally followed by `:x`, `:X` or `:d`. `{{` and `}}` are literal
/// braces. Hex specs only apply to the checksum.
fn apply_format(format: &str, digest: &str, checksum: u64) -> Result<String, SigningError> {
    let invalid = |reason: &str| SigningError::InvalidFormat {
        format: format.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(format.len() + digest.len() + 8);
    let mut next_auto = 0usize;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(invalid("unmatched '}'")),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => return Err(invalid("unterminated field")),
                    }
                }
                let (position, spec) = match field.split_once(':') {
                    Some((p, s)) => (p, s),
                    None => (field.as_str(), ""),
                };
                let index = if position.is_empty() {
                    next_auto += 1;
                    next_auto - 1
                } else {
                    position
                        .parse::<usize>()
                        .map_err(|_| invalid("field index is not a number"))?
                };
                match (index, spec) {
                    (0, "") => out.push_str(digest),
                    (0, _) => return Err(invalid("the digest only accepts an empty spec")),
                    (1, "" | "d") => out.push_str(&checksum.to_string()),
                    (1, "x") => out.push_str(&format!("{:x}", checksum)),
                    (1, "X") => out.push_str(&format!("{:X}", checksum)),
                    (1, _) => return Err(invalid("unsupported checksum spec")),
                    _ => return Err(invalid("field index out of range")),
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
