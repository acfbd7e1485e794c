//! The crawl graph: pages, edges and parameter endpoints.

use crate::canonical::CanonicalUrl;
use crate::extract::FormMethod;
use crate::fetch::NetworkErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Final status of a page, either an HTTP status code or the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Http(u16),
    Failed(NetworkErrorKind),
    TooLarge,
}

impl PageStatus {
    pub fn is_error(&self) -> bool {
        match self {
            PageStatus::Http(code) => *code >= 400,
            PageStatus::Failed(_) | PageStatus::TooLarge => true,
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStatus::Http(code) => write!(f, "{}", code),
            PageStatus::Failed(kind) => write!(f, "error:{}", kind),
            PageStatus::TooLarge => f.write_str("error:too-large"),
        }
    }
}

/// One crawled page. Created exactly once per CanonicalUrl, on its first
/// fetch attempt; only the out-degree is filled in afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: CanonicalUrl,
    pub depth: usize,
    pub status: PageStatus,
    /// Count of distinct outbound targets, including ones the domain filter
    /// kept out of the frontier.
    pub out_degree: usize,
    pub fetched_at: DateTime<Utc>,
}

/// A directed link between two canonical URLs.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub source: CanonicalUrl,
    pub target: CanonicalUrl,
}

/// How a parameter endpoint was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    QueryString,
    Form,
}

/// An endpoint that accepts externally supplied values, either through its
/// query string or through a form targeting it.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterEndpoint {
    pub url: CanonicalUrl,
    pub source: ParamSource,
    pub method: FormMethod,
    pub params: Vec<String>,
}

/// The accumulated result of a run. Append-only while the crawl is live;
/// consumers get clones, never shared references.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub pages: HashMap<CanonicalUrl, PageRecord>,
    pub edges: Vec<Edge>,
    pub endpoints: Vec<ParameterEndpoint>,

    #[serde(skip)]
    edge_index: HashSet<(CanonicalUrl, CanonicalUrl)>,
    #[serde(skip)]
    endpoint_index: HashSet<(CanonicalUrl, ParamSource)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for a page. Idempotent: a second call for the same
    /// key leaves the original status and depth untouched.
    pub fn record_page(&mut self, key: CanonicalUrl, depth: usize, status: PageStatus) {
        self.pages.entry(key.clone()).or_insert_with(|| PageRecord {
            url: key,
            depth,
            status,
            out_degree: 0,
            fetched_at: Utc::now(),
        });
    }

    /// Fill in the out-degree once extraction has finished for the page.
    pub fn set_out_degree(&mut self, key: &CanonicalUrl, out_degree: usize) {
        if let Some(record) = self.pages.get_mut(key) {
            record.out_degree = out_degree;
        }
    }

    /// Record a directed edge. Duplicates collapse; returns whether the edge
    /// was new.
    pub fn record_edge(&mut self, source: CanonicalUrl, target: CanonicalUrl) -> bool {
        if !self.edge_index.insert((source.clone(), target.clone())) {
            return false;
        }
        self.edges.push(Edge { source, target });
        true
    }

    /// Flag a URL whose query string carries parameters.
    pub fn record_query_endpoint(&mut self, key: CanonicalUrl, params: Vec<String>) {
        if !self.endpoint_index.insert((key.clone(), ParamSource::QueryString)) {
            return;
        }
        self.endpoints.push(ParameterEndpoint {
            url: key,
            source: ParamSource::QueryString,
            method: FormMethod::Get,
            params,
        });
    }

    /// Flag a form action with its method and named inputs.
    pub fn record_form_endpoint(
        &mut self,
        key: CanonicalUrl,
        method: FormMethod,
        params: Vec<String>,
    ) {
        if !self.endpoint_index.insert((key.clone(), ParamSource::Form)) {
            return;
        }
        self.endpoints.push(ParameterEndpoint {
            url: key,
            source: ParamSource::Form,
            method,
            params,
        });
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Does any parameter endpoint point at this URL?
    pub fn accepts_params(&self, key: &CanonicalUrl) -> bool {
        self.endpoints.iter().any(|e| &e.url == key)
    }

    /// Every URL mentioned by the graph, fetched or not: page keys plus edge
    /// targets the domain filter kept out.
    pub fn known_urls(&self) -> HashSet<&CanonicalUrl> {
        let mut urls: HashSet<&CanonicalUrl> = self.pages.keys().collect();
        for edge in &self.edges {
            urls.insert(&edge.source);
            urls.insert(&edge.target);
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalize;
    use url::Url;

    fn key(path: &str) -> CanonicalUrl {
        let base = Url::parse("http://graph.test/").unwrap();
        canonicalize(&base, path).unwrap()
    }

    #[test]
    fn page_record_created_once() {
        let mut graph = Graph::new();
        graph.record_page(key("/a"), 1, PageStatus::Http(200));
        graph.record_page(key("/a"), 3, PageStatus::Http(500));

        let record = &graph.pages[&key("/a")];
        assert_eq!(record.depth, 1);
        assert_eq!(record.status, PageStatus::Http(200));
    }

    #[test]
    fn out_degree_updates_existing_record() {
        let mut graph = Graph::new();
        graph.record_page(key("/a"), 0, PageStatus::Http(200));
        graph.set_out_degree(&key("/a"), 7);
        assert_eq!(graph.pages[&key("/a")].out_degree, 7);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = Graph::new();
        assert!(graph.record_edge(key("/a"), key("/b")));
        assert!(!graph.record_edge(key("/a"), key("/b")));
        assert!(graph.record_edge(key("/b"), key("/a")));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn endpoints_dedup_by_url_and_kind() {
        let mut graph = Graph::new();
        graph.record_query_endpoint(key("/x?id=1"), vec!["id".into()]);
        graph.record_query_endpoint(key("/x?id=1"), vec!["id".into()]);
        graph.record_form_endpoint(key("/x?id=1"), FormMethod::Post, vec!["id".into()]);
        assert_eq!(graph.endpoints.len(), 2);
        assert!(graph.accepts_params(&key("/x?id=1")));
        assert!(!graph.accepts_params(&key("/y")));
    }

    #[test]
    fn known_urls_include_unfetched_targets() {
        let mut graph = Graph::new();
        graph.record_page(key("/a"), 0, PageStatus::Http(200));
        graph.record_edge(key("/a"), key("http://external.test/"));
        let urls = graph.known_urls();
        assert!(urls.contains(&key("/a")));
        assert!(urls.contains(&key("http://external.test/")));
    }

    #[test]
    fn status_rendering() {
        assert_eq!(PageStatus::Http(200).to_string(), "200");
        assert_eq!(
            PageStatus::Failed(NetworkErrorKind::Timeout).to_string(),
            "error:timeout"
        );
        assert_eq!(PageStatus::TooLarge.to_string(), "error:too-large");
        assert!(!PageStatus::Http(200).is_error());
        assert!(PageStatus::Http(404).is_error());
        assert!(PageStatus::TooLarge.is_error());
    }
}
