use clap::ArgMatches;
use colored::Colorize;
use sitegraph_core::crawl::{CrawlOptions, execute_crawl};
use sitegraph_core::report::{ReportFormat, render_report, save_report};
use sitegraph_scanner::CrawlConfig;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

/// Build the engine configuration from the crawl subcommand's arguments.
pub fn config_from_matches(sub_matches: &ArgMatches, seed_url: String) -> CrawlConfig {
    let depth = *sub_matches.get_one::<usize>("depth").unwrap();
    let max_pages = *sub_matches.get_one::<usize>("max-pages").unwrap();
    let threads = *sub_matches.get_one::<usize>("threads").unwrap();
    let delay = *sub_matches.get_one::<u64>("delay").unwrap();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap();
    let follow_external = sub_matches.get_flag("follow-external");

    CrawlConfig::new(seed_url)
        .with_max_depth(depth)
        .with_max_pages(max_pages)
        .with_workers(threads)
        .with_delay(Duration::from_secs(delay))
        .with_timeout(Duration::from_secs(timeout))
        .with_same_domain_only(!follow_external)
}

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let raw_url = sub_matches.get_one::<String>("url").unwrap();
    let Some(seed_url) = parse_url_line(raw_url.trim()) else {
        eprintln!("{} Invalid URL: {}", "✗".red(), raw_url);
        std::process::exit(1);
    };

    let config = config_from_matches(sub_matches, seed_url.clone());
    let output = sub_matches.get_one::<PathBuf>("output").cloned();
    let format = sub_matches.get_one::<String>("format").unwrap();
    let format = ReportFormat::from_str(format).unwrap_or(ReportFormat::Text);

    let seed_host = Url::parse(&seed_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "unknown".to_string());

    println!("\nCrawling {}", seed_host.bright_cyan().bold());
    println!("Workers: {}", config.workers);
    println!("Max depth: {}", config.max_depth);
    println!("Max pages: {}", config.max_pages);
    println!(
        "Cross-domain: {}\n",
        if config.same_domain_only {
            "disabled (stay on seed host)"
        } else {
            "enabled"
        }
    );

    let options = CrawlOptions {
        config,
        show_progress_bars: true,
    };

    let graph = match execute_crawl(options, None).await {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    println!("\n{} Crawl complete!\n", "✓".green());

    let report = match render_report(&graph, &format) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Failed to render report: {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => match save_report(&report, &path) {
            Ok(()) => println!("Report saved to {}", path.display()),
            Err(e) => {
                eprintln!("{} Failed to write {}: {}", "✗".red(), path.display(), e);
                std::process::exit(1);
            }
        },
        None => print!("{}", report),
    }
}
