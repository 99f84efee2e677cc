//! Domain resolution for tracked URLs.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// A tracked site, e.g. `github.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
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

/// Resolves the domain to attribute time to.
///
/// Only `http` and `https` pages are tracked; browser-internal schemes and
/// unparseable URLs resolve to `None`. A leading `www.` is stripped.
pub fn resolve_domain(url: &str) -> Option<Domain> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(Domain(host.to_string()))
}
