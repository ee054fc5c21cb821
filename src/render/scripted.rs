//! In-memory rendering session for tests
//!
//! Serves canned documents by URL and records every navigation, wait and
//! scroll instead of touching the network or sleeping.

use crate::render::{Navigation, RenderError, RenderSession, RenderedPage, Renderer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
enum Scripted {
    Page { status: u16, html: String },
    NavigationFails,
    EvaluationFails,
}

/// Everything a session did, shared across every session of one site
#[derive(Debug, Default)]
pub(crate) struct SessionLog {
    pub navigations: Vec<String>,
    pub waits: Vec<Duration>,
    pub scrolls: usize,
    pub opened: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedSite {
    pages: HashMap<String, Scripted>,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: impl Into<String>) -> Self {
        self.with_status(url, 200, html)
    }

    pub fn with_status(mut self, url: &str, status: u16, html: impl Into<String>) -> Self {
        self.pages.insert(
            url.to_string(),
            Scripted::Page {
                status,
                html: html.into(),
            },
        );
        self
    }

    pub fn failing_navigation(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Scripted::NavigationFails);
        self
    }

    pub fn failing_evaluation(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Scripted::EvaluationFails);
        self
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap()
    }

    pub fn session(&self) -> ScriptedSession {
        self.log().opened += 1;
        ScriptedSession {
            site: self.clone(),
            current: None,
            evaluation_fails: false,
            closed: false,
        }
    }
}

#[async_trait]
impl Renderer for ScriptedSite {
    type Session = ScriptedSession;

    async fn open(&self) -> Result<ScriptedSession, RenderError> {
        Ok(self.session())
    }
}

pub(crate) struct ScriptedSession {
    site: ScriptedSite,
    current: Option<RenderedPage>,
    evaluation_fails: bool,
    closed: bool,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<Navigation, RenderError> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.site.log().navigations.push(url.to_string());

        let (status, html, evaluation_fails) = match self.site.pages.get(url.as_str()) {
            Some(Scripted::Page { status, html }) => (*status, html.clone(), false),
            Some(Scripted::EvaluationFails) => (200, String::new(), true),
            Some(Scripted::NavigationFails) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                })
            }
            None => (404, String::new(), false),
        };

        self.evaluation_fails = evaluation_fails;
        self.current = Some(RenderedPage {
            url: url.clone(),
            status,
            html,
        });

        Ok(Navigation {
            status,
            final_url: url.clone(),
        })
    }

    async fn document(&self) -> Result<RenderedPage, RenderError> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        if self.evaluation_fails {
            return Err(RenderError::Evaluation("execution context destroyed".to_string()));
        }
        self.current.clone().ok_or(RenderError::NoDocument)
    }

    async fn scroll_viewport(&mut self) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.site.log().scrolls += 1;
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        self.site.log().waits.push(duration);
    }

    async fn content(&self) -> Result<String, RenderError> {
        self.current
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or(RenderError::NoDocument)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.closed = true;
        self.site.log().closed += 1;
        Ok(())
    }
}

/// Listing page markup with `count` product cards and pagination labels `1..=pages`
pub(crate) fn listing_html(prefix: &str, count: usize, pages: u32) -> String {
    let items: String = (0..count)
        .map(|i| {
            format!(
                r#"<li><div class="listagem-item prod-id-{i}">
                    <a class="produto-sobrepor" href="/{prefix}-{i}"></a>
                    <span class="nome-produto">{prefix} {i}</span>
                    <strong class="preco-venda">1.0{d},00</strong>
                </div></li>"#,
                i = i,
                prefix = prefix,
                d = i % 10,
            )
        })
        .collect();

    let labels: String = (1..=pages)
        .map(|p| format!(r#"<a href="?pagina={p}">{p}</a>"#, p = p))
        .collect();

    format!(
        r#"<html><body><ul class="vitrine">{}</ul><div class="paginacao">{}</div></body></html>"#,
        items, labels
    )
}
