use indicatif::{ProgressBar, ProgressStyle};
use sitegraph_scanner::{
    CrawlConfig, CrawlEvent, Crawler, EventCallback, Graph, PageRecord, PageStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub config: CrawlConfig,
    pub show_progress_bars: bool,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// ANSI-colored label for a page status, keyed off the status class.
pub fn status_label(status: &PageStatus) -> String {
    match *status {
        PageStatus::Http(code) => match code {
            100..=199 => format!("\x1b[37m{}\x1b[0m", code), // White
            200..=299 => format!("\x1b[32m{}\x1b[0m", code), // Green
            300..=399 => format!("\x1b[36m{}\x1b[0m", code), // Cyan
            400..=499 => format!("\x1b[33m{}\x1b[0m", code), // Orange/Yellow
            500..=599 => format!("\x1b[31m{}\x1b[0m", code), // Red
            _ => format!("{}", code),
        },
        other => format!("\x1b[31m{}\x1b[0m", other),
    }
}

fn format_event_line(event: &CrawlEvent) -> String {
    format!(
        "  {} {} depth={} links={}",
        status_label(&event.status),
        extract_url_path(event.url.as_str()),
        event.depth,
        event.out_degree
    )
}

/// Execute a crawl with the given options
/// Returns the final graph snapshot
pub async fn execute_crawl(
    options: CrawlOptions,
    event_callback: Option<EventCallback>,
) -> Result<Graph, String> {
    let CrawlOptions {
        config,
        show_progress_bars,
    } = options;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    // Counter for tracking completed fetches
    let processed_count = Arc::new(AtomicUsize::new(0));

    // Internal callback: drive the spinner, print a live line per completed
    // fetch, and forward the event to the caller
    let internal_callback: EventCallback = {
        let pb_clone = progress_bar.clone();
        let count_clone = processed_count.clone();
        Arc::new(move |event: CrawlEvent| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.println(format_event_line(&event));
                pb.set_message(format!("Crawling... {} pages mapped", count));
                pb.tick();
            }
            if let Some(ref outer) = event_callback {
                outer(event);
            }
        })
    };

    let crawler = Crawler::new(config).with_event_callback(internal_callback);
    let graph = crawler.run().await.map_err(|e| e.to_string())?;

    // Finish progress bar (only if enabled)
    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!("Crawl complete! {} pages mapped", graph.page_count()));
    }

    Ok(graph)
}

/// Generate a crawl report from a graph snapshot
pub fn generate_crawl_report(graph: &Graph) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages mapped: {}\n", graph.page_count()));
    report.push_str(&format!("  Edges recorded: {}\n", graph.edge_count()));
    report.push_str(&format!(
        "  Parameter endpoints: {}\n",
        graph.endpoints.len()
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group pages by host
    let mut by_host: HashMap<String, Vec<&PageRecord>> = HashMap::new();
    for record in graph.pages.values() {
        let host = record.url.host().unwrap_or("unknown").to_string();
        by_host.entry(host).or_default().push(record);
    }

    let mut hosts: Vec<_> = by_host.keys().cloned().collect();
    hosts.sort();

    for host in hosts {
        let mut host_records = by_host.remove(&host).unwrap_or_default();
        host_records.sort_by(|a, b| a.url.cmp(&b.url));

        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", host_records.len()));

        for record in host_records {
            let path = extract_url_path(record.url.as_str());
            let mut line = format!(
                "  {} {} depth={} links={}",
                status_label(&record.status),
                path,
                record.depth,
                record.out_degree
            );
            if graph.accepts_params(&record.url) {
                line.push_str(" \x1b[35m[params]\x1b[0m");
            }
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    if !graph.endpoints.is_empty() {
        report.push_str("# Parameter endpoints:\n");
        for endpoint in &graph.endpoints {
            report.push_str(&format!(
                "  {} {} params: {}\n",
                endpoint.method,
                endpoint.url,
                endpoint.params.join(", ")
            ));
        }
        report.push('\n');
    }

    report
}
