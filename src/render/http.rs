//! HTTP-backed rendering session
//!
//! Fetches listing markup with `reqwest` and exposes it as a static document
//! snapshot. Each session owns its own client, so cookies picked up during the
//! warm-up visit live exactly as long as one crawl attempt.

use crate::config::SessionConfig;
use crate::render::{Navigation, RenderError, RenderSession, RenderedPage, Renderer};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client presenting the configured browser identity
///
/// # Example
///
/// ```no_run
/// use parrilla_harvest::config::SessionConfig;
/// use parrilla_harvest::render::build_http_client;
///
/// let client = build_http_client(&SessionConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SessionConfig) -> Result<Client, RenderError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(RenderError::Client)
}

/// Opens [`HttpSession`]s
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    config: SessionConfig,
}

impl HttpRenderer {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, RenderError> {
        let client = build_http_client(&self.config)?;
        tracing::debug!("Opened HTTP session ({})", self.config.user_agent);
        Ok(HttpSession::new(client))
    }
}

/// Session holding the last fetched document
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    current: Option<RenderedPage>,
    closed: bool,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed {
            Err(RenderError::Closed)
        } else {
            Ok(())
        }
    }

    fn classify(url: &Url, error: reqwest::Error) -> RenderError {
        if error.is_timeout() {
            RenderError::Timeout {
                url: url.to_string(),
            }
        } else {
            RenderError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Navigation, RenderError> {
        self.ensure_open()?;

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| Self::classify(url, e))?;

        tracing::debug!("Loaded {} (HTTP {}, {} bytes)", final_url, status, html.len());

        self.current = Some(RenderedPage {
            url: final_url.clone(),
            status,
            html,
        });

        Ok(Navigation { status, final_url })
    }

    async fn document(&self) -> Result<RenderedPage, RenderError> {
        self.ensure_open()?;
        self.current.clone().ok_or(RenderError::NoDocument)
    }

    async fn scroll_viewport(&mut self) -> Result<(), RenderError> {
        // A static snapshot has nothing left to lazy-load.
        self.ensure_open()?;
        match self.current {
            Some(_) => Ok(()),
            None => Err(RenderError::NoDocument),
        }
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn content(&self) -> Result<String, RenderError> {
        self.ensure_open()?;
        self.current
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or(RenderError::NoDocument)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.current = None;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&SessionConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_language_header_is_skipped() {
        let config = SessionConfig {
            accept_language: "pt-BR\n".to_string(),
            ..SessionConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_fresh_session_has_no_document() {
        let renderer = HttpRenderer::new(SessionConfig::default());
        let mut session = renderer.open().await.unwrap();

        assert!(matches!(
            session.document().await,
            Err(RenderError::NoDocument)
        ));
        assert!(matches!(
            session.scroll_viewport().await,
            Err(RenderError::NoDocument)
        ));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let renderer = HttpRenderer::new(SessionConfig::default());
        let mut session = renderer.open().await.unwrap();
        session.close().await.unwrap();

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        assert!(matches!(
            session.navigate(&url, Duration::from_secs(1)).await,
            Err(RenderError::Closed)
        ));
        assert!(matches!(session.content().await, Err(RenderError::Closed)));
    }
}
