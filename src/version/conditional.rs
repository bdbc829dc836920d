//! Conditional-read (ETag-style) protocol
//!
//! A response carries the domain's version as an opaque token (`"v<N>"`). A
//! reader presenting a previously-seen token that still matches the current
//! version short-circuits to Not Modified without materializing the payload.
//! An unparseable token is treated as a mismatch, never an error.

/// Outcome of a conditional read against the current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalRead {
    /// The presented token matches the current version.
    NotModified { version: u64 },
    /// The payload must be returned, tagged with the current version.
    Modified { version: u64 },
}

impl ConditionalRead {
    /// Evaluate a presented token (if any) against the current version.
    pub fn evaluate(current: u64, presented: Option<&str>) -> Self {
        match presented.and_then(parse_token) {
            Some(v) if v == current => ConditionalRead::NotModified { version: current },
            _ => ConditionalRead::Modified { version: current },
        }
    }

    /// The current version, regardless of outcome.
    pub fn version(&self) -> u64 {
        match self {
            ConditionalRead::NotModified { version } => *version,
            ConditionalRead::Modified { version } => *version,
        }
    }
}

/// Render a version as an opaque validator token.
pub fn render_token(version: u64) -> String {
    format!("\"v{}\"", version)
}

/// Parse a validator token back to a version. Accepts quoted and unquoted
/// forms; anything else is None.
pub fn parse_token(token: &str) -> Option<u64> {
    let inner = token.trim().trim_matches('"');
    inner.strip_prefix('v')?.parse().ok()
}
