use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::document::Document;
use crate::error::FetchError;
use crate::parser::parse_html;

/// Retrieves a page and parses it into a [`Document`], using the page URL as base.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError>;
}

/// Single-attempt GET over reqwest. No retries, no caching.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        parse_html(&body, url).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned documents and records every requested URL.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, Document>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn with_page(mut self, url: &str, doc: Document) -> Self {
            self.pages.insert(url.to_string(), doc);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::document::H_CARD;

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        HttpFetcher::new(&Settings {
            fetch_timeout_secs: timeout_secs,
            ..Settings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn parses_page_against_its_own_url() {
        let server = MockServer::start().await;
        let html = std::fs::read_to_string("tests/fixtures/author_page_uid.html").unwrap();
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/about", server.uri())).unwrap();
        let doc = fetcher(5).fetch(&url).await.unwrap();

        assert!(doc.items[0].has_type(H_CARD));
        assert_eq!(doc.items[0].first_str("uid"), Some(url.as_str()));
        assert_eq!(
            doc.items[0].first_str("photo"),
            Some(format!("{}/images/basho.jpg", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();

        let err = fetcher(5).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/about").unwrap();
        let err = fetcher(5).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn slow_host_hits_the_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let err = fetcher(1).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { ref source, .. } if source.is_timeout()));
    }
}
