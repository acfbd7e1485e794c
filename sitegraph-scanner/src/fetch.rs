//! The page fetcher: one HTTP request, classified into a [`FetchOutcome`].

use crate::config::CrawlConfig;
use crate::error::Result;
use reqwest::Client;
use serde::Serialize;
use std::error::Error as _;
use std::fmt;
use tracing::debug;
use url::Url;

/// Why a request failed below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Timeout,
    Refused,
    Dns,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Refused => "refused",
            NetworkErrorKind::Dns => "dns",
            NetworkErrorKind::Other => "network",
        };
        f.write_str(label)
    }
}

/// The result of a single fetch attempt. Every attempt produces exactly one
/// of these; the fetcher never raises for network or HTTP failures.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response, body fully read.
    Success {
        status: u16,
        content_type: Option<String>,
        body: String,
    },
    /// A response arrived but with a non-2xx status.
    HttpError { status: u16 },
    /// The request never produced a usable response.
    NetworkError { kind: NetworkErrorKind },
    /// The body exceeded the configured byte ceiling and was abandoned.
    TooLarge { limit: u64 },
}

pub struct Fetcher {
    client: Client,
    max_body_bytes: u64,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Perform one request and classify the outcome. Timeouts, refusals and
    /// oversized bodies all come back as outcomes, never as errors.
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        debug!("Fetching {}", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome::NetworkError {
                    kind: classify_network_error(&e),
                };
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(length) = response.content_length()
            && length > self.max_body_bytes
        {
            return FetchOutcome::TooLarge {
                limit: self.max_body_bytes,
            };
        }

        if !status.is_success() {
            return FetchOutcome::HttpError {
                status: status.as_u16(),
            };
        }

        // The content-length header is optional, so the ceiling has to hold
        // while streaming too.
        let mut response = response;
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() as u64 + chunk.len() as u64 > self.max_body_bytes {
                        return FetchOutcome::TooLarge {
                            limit: self.max_body_bytes,
                        };
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return FetchOutcome::NetworkError {
                        kind: classify_network_error(&e),
                    };
                }
            }
        }

        FetchOutcome::Success {
            status: status.as_u16(),
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }
}

/// Best-effort mapping of a reqwest error onto the outcome taxonomy.
fn classify_network_error(err: &reqwest::Error) -> NetworkErrorKind {
    if err.is_timeout() {
        return NetworkErrorKind::Timeout;
    }
    if err.is_connect() {
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>()
                && io.kind() == std::io::ErrorKind::ConnectionRefused
            {
                return NetworkErrorKind::Refused;
            }
            let text = cause.to_string();
            if text.contains("dns") || text.contains("lookup") {
                return NetworkErrorKind::Dns;
            }
            source = cause.source();
        }
        return NetworkErrorKind::Refused;
    }
    NetworkErrorKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fetcher_for(server: &MockServer, timeout_ms: u64, max_body: u64) -> Fetcher {
        let config = CrawlConfig::new(server.uri())
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_max_body_bytes(max_body);
        Fetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn success_carries_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>hi</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 2000, 1024 * 1024);
        let url = Url::parse(&server.uri()).unwrap();
        match fetcher.fetch(&url).await {
            FetchOutcome::Success {
                status,
                content_type,
                body,
            } => {
                assert_eq!(status, 200);
                assert_eq!(content_type.as_deref(), Some("text/html"));
                assert!(body.contains("hi"));
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_2xx_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 2000, 1024 * 1024);
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        match fetcher.fetch(&url).await {
            FetchOutcome::HttpError { status } => assert_eq!(status, 404),
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 100, 1024 * 1024);
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        match fetcher.fetch(&url).await {
            FetchOutcome::NetworkError { kind } => assert_eq!(kind, NetworkErrorKind::Timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_body_is_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(vec![b'x'; 4096]),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 2000, 64);
        let url = Url::parse(&format!("{}/big", server.uri())).unwrap();
        match fetcher.fetch(&url).await {
            FetchOutcome::TooLarge { limit } => assert_eq!(limit, 64),
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }
}
