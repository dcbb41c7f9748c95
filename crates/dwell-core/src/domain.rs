//! Domain extraction and normalization.
//!
//! A [`Domain`] is the unit time is attributed to: the URL's hostname, lowercased,
//! with a single leading `www.` removed. Scheme, port, path, query and fragment
//! never take part, so every page of a site lands in the same bucket.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::ValidationError;

/// A normalized hostname that time is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Creates a domain from an already extracted hostname.
    ///
    /// The value is normalized the same way as [`Domain::from_url`].
    pub fn new(host: impl AsRef<str>) -> Result<Self, ValidationError> {
        normalize_host(host.as_ref())
            .map(Self)
            .ok_or(ValidationError::Empty { field: "domain" })
    }

    /// Extracts the domain from a URL.
    ///
    /// Returns `None` for unparsable URLs and URLs without a host
    /// (`about:blank`, `data:` URLs, `file://` paths). These are treated as
    /// "nothing trackable" rather than errors.
    pub fn from_url(raw: &str) -> Option<Self> {
        let url = match Url::parse(raw.trim()) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(url = raw, error = %err, "unparsable url, no domain");
                return None;
            }
        };
        url.host_str().and_then(normalize_host).map(Self)
    }

    /// Returns the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

impl TryFrom<String> for Domain {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
