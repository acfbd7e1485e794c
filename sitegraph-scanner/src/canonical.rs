//! URL canonicalization and the same-domain filter.
//!
//! A [`CanonicalUrl`] is the dedup key for a page: two raw URLs that
//! canonicalize to the same key are the same node in the crawl graph.

use crate::error::{CrawlError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// A normalized URL used as a node identity.
///
/// Scheme and host are lower-cased, default ports and the fragment are
/// stripped, an empty path collapses to `/` and trailing slashes are trimmed
/// off non-root paths. The query string is preserved: `/x?id=1` and `/x` are
/// distinct endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn has_query(&self) -> bool {
        self.0.query().is_some_and(|q| !q.is_empty())
    }

    /// Parameter names from the query string, first occurrence order.
    pub fn query_param_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, _) in self.0.query_pairs() {
            if !names.iter().any(|n| n == name.as_ref()) {
                names.push(name.into_owned());
            }
        }
        names
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolve a raw reference against a base URL.
///
/// Rejects non-http(s) schemes and drops the fragment. The result is what the
/// fetcher should actually request; [`canonical_key`] derives identity from it.
pub fn resolve(base: &Url, raw: &str) -> Result<Url> {
    let mut resolved = base
        .join(raw)
        .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match resolved.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CrawlError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, raw
            )));
        }
    }

    resolved.set_fragment(None);
    Ok(resolved)
}

/// Derive the dedup key from an already-resolved http(s) URL.
///
/// The `url` crate already lower-cases the host and omits default ports when
/// serializing, so the remaining work is fragment removal and trailing-slash
/// trimming.
pub fn canonical_key(url: &Url) -> CanonicalUrl {
    let mut canonical = url.clone();
    canonical.set_fragment(None);

    let path = canonical.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            canonical.set_path("/");
        } else {
            canonical.set_path(&trimmed);
        }
    }

    CanonicalUrl(canonical)
}

/// Resolve and canonicalize in one step.
pub fn canonicalize(base: &Url, raw: &str) -> Result<CanonicalUrl> {
    Ok(canonical_key(&resolve(base, raw)?))
}

/// Domain filter: may a link on `candidate_host` enter the frontier?
///
/// Exact host comparison, no subdomain widening: `sub.example.com` is not
/// `example.com`.
pub fn host_allowed(seed_host: &str, candidate_host: &str, same_domain_only: bool) -> bool {
    if !same_domain_only {
        return true;
    }
    seed_host == candidate_host
}
