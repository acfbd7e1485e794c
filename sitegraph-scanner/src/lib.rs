pub mod canonical;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod graph;

pub use canonical::{CanonicalUrl, canonicalize, host_allowed};
pub use config::CrawlConfig;
pub use crawler::{CrawlEvent, CrawlState, Crawler, EventCallback};
pub use error::CrawlError;
pub use extract::{FormDescriptor, FormMethod};
pub use fetch::{FetchOutcome, NetworkErrorKind};
pub use graph::{Edge, Graph, PageRecord, PageStatus, ParamSource, ParameterEndpoint};
