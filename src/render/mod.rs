//! Rendering collaborator
//!
//! The crawler never talks to HTTP or a browser directly. It drives a
//! [`RenderSession`], which can navigate to a URL, hand back a snapshot of the
//! current document for querying, scroll, and wait. A [`Renderer`] opens one
//! exclusively-owned session per crawl attempt.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{build_http_client, HttpRenderer, HttpSession};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a rendering session
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Navigation timeout for {url}")]
    Timeout { url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Document evaluation failed: {0}")]
    Evaluation(String),

    #[error("No document loaded")]
    NoDocument,

    #[error("Session is closed")]
    Closed,
}

/// Outcome of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// HTTP status of the main document
    pub status: u16,

    /// URL after redirects
    pub final_url: Url,
}

impl Navigation {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Snapshot of the document currently loaded in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Location of the document (after redirects)
    pub url: Url,
    pub status: u16,
    pub html: String,
}

/// Opens rendering sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    type Session: RenderSession;

    /// Opens a fresh session with no state carried over from earlier ones
    async fn open(&self) -> Result<Self::Session, RenderError>;
}

/// A live rendering session
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Loads `url` as the current document
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<Navigation, RenderError>;

    /// Returns a snapshot of the current document for querying
    async fn document(&self) -> Result<RenderedPage, RenderError>;

    /// Scrolls the viewport down by one screen
    async fn scroll_viewport(&mut self) -> Result<(), RenderError>;

    /// Suspends for `duration`
    async fn wait(&self, duration: Duration);

    /// Raw HTML of the current document
    async fn content(&self) -> Result<String, RenderError>;

    /// Tears the session down; later calls fail with [`RenderError::Closed`]
    async fn close(&mut self) -> Result<(), RenderError>;
}
