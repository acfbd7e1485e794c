// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{config_from_matches, parse_url_line};

// Re-export crawl functionality from sitegraph-core
pub use sitegraph_core::crawl::{
    CrawlOptions, execute_crawl, extract_url_path, generate_crawl_report,
};
