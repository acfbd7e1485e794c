// Report generation and export from a graph snapshot

use crate::crawl::generate_crawl_report;
use anyhow::Result;
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use sitegraph_scanner::{CanonicalUrl, Graph};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Dot,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "dot" | "graphviz" => Some(ReportFormat::Dot),
            _ => None,
        }
    }
}

/// Render a graph snapshot in the requested format.
pub fn render_report(graph: &Graph, format: &ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(graph)),
        ReportFormat::Json => Ok(generate_json_report(graph)?),
        ReportFormat::Csv => Ok(generate_csv_report(graph)),
        ReportFormat::Dot => Ok(generate_dot_report(graph)),
    }
}

pub fn generate_json_report(graph: &Graph) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "sitegraph",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "total_pages": graph.page_count(),
                "total_edges": graph.edge_count(),
                "parameter_endpoints": graph.endpoints.len()
            },
            "graph": graph
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// One row per page, the columns of the classic results table.
pub fn generate_csv_report(graph: &Graph) -> String {
    let mut csv = String::from("url,depth,status,accepts_params,params,out_degree\n");

    let mut records: Vec<_> = graph.pages.values().collect();
    records.sort_by(|a, b| a.url.cmp(&b.url));

    for record in records {
        let params: Vec<&str> = graph
            .endpoints
            .iter()
            .filter(|e| e.url == record.url)
            .flat_map(|e| e.params.iter().map(String::as_str))
            .collect();

        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(record.url.as_str()),
            record.depth,
            record.status,
            graph.accepts_params(&record.url),
            csv_field(&params.join(";")),
            record.out_degree
        ));
    }

    csv
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Graphviz rendering of the crawl graph, including edge targets the domain
/// filter kept out of the frontier.
pub fn generate_dot_report(graph: &Graph) -> String {
    let mut dot_graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: HashMap<&CanonicalUrl, _> = HashMap::new();

    let mut urls: Vec<&CanonicalUrl> = graph.known_urls().into_iter().collect();
    urls.sort();
    for url in urls {
        let index = dot_graph.add_node(url.as_str());
        indices.insert(url, index);
    }

    for edge in &graph.edges {
        if let (Some(&source), Some(&target)) =
            (indices.get(&edge.source), indices.get(&edge.target))
        {
            dot_graph.add_edge(source, target, ());
        }
    }

    format!("{:?}", Dot::with_config(&dot_graph, &[Config::EdgeNoLabel]))
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
