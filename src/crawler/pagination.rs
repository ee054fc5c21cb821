//! Pagination detection
//!
//! Estimates how many listing pages a category has from the numeric labels in
//! its pagination control. Detection is best-effort: anything unreadable
//! counts as a single page.

use crate::render::{RenderSession, RenderedPage};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

fn pagination_links() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse(r#".paginacao a, .pagination a, [class*="pag"] a"#)
            .expect("static pagination selector")
    })
}

/// Detects the page count of the listing currently loaded in `session`
///
/// Returns at least 1. Failing to read the document yields 1.
pub async fn detect_page_count<S>(session: &S, page_param: &str) -> u32
where
    S: RenderSession + ?Sized,
{
    match session.document().await {
        Ok(page) => count_pages(&page, page_param),
        Err(e) => {
            tracing::warn!("Pagination detection failed, assuming 1 page: {}", e);
            1
        }
    }
}

/// Page count for a listing snapshot
///
/// The larger of the highest numeric pagination label and the page number in
/// the URL's `page_param` query parameter.
pub fn count_pages(page: &RenderedPage, page_param: &str) -> u32 {
    let document = Html::parse_document(&page.html);

    let max_label = document
        .select(pagination_links())
        .filter_map(|link| leading_number(&link.text().collect::<String>()))
        .max()
        .unwrap_or(1);

    max_label.max(current_page(&page.url, page_param)).max(1)
}

/// Page number encoded in the URL, defaulting to 1
pub fn current_page(url: &Url, page_param: &str) -> u32 {
    url.query_pairs()
        .find(|(key, _)| key == page_param)
        .and_then(|(_, value)| leading_number(&value))
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Parses the leading digits of a label ("3", " 12 ", "4»")
fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scripted::ScriptedSite;

    fn page(url: &str, body: &str) -> RenderedPage {
        RenderedPage {
            url: Url::parse(url).unwrap(),
            status: 200,
            html: format!("<html><body>{}</body></html>", body),
        }
    }

    #[test]
    fn test_max_label_wins() {
        let html = r#"
            <div class="paginacao">
                <a href="?pagina=1">1</a><a href="?pagina=2">2</a>
                <a href="?pagina=7">7</a><a href="?pagina=2">Próxima »</a>
            </div>
        "#;
        assert_eq!(count_pages(&page("https://shop.example.com/grills", html), "pagina"), 7);
    }

    #[test]
    fn test_alternative_pagination_classes() {
        let html = r#"<ul class="pagination"><li><a>1</a></li><li><a>4</a></li></ul>"#;
        assert_eq!(count_pages(&page("https://shop.example.com/a", html), "pagina"), 4);

        let html = r#"<nav class="listing-pager"><a>1</a><a>3</a></nav>"#;
        assert_eq!(count_pages(&page("https://shop.example.com/a", html), "pagina"), 3);
    }

    #[test]
    fn test_no_pagination_is_one_page() {
        assert_eq!(count_pages(&page("https://shop.example.com/a", "<p>x</p>"), "pagina"), 1);
    }

    #[test]
    fn test_url_page_beats_labels() {
        let html = r#"<div class="paginacao"><a>1</a><a>2</a></div>"#;
        let snapshot = page("https://shop.example.com/a?pagina=5", html);
        assert_eq!(count_pages(&snapshot, "pagina"), 5);
    }

    #[test]
    fn test_current_page() {
        let url = Url::parse("https://shop.example.com/a?pagina=3&ordem=preco").unwrap();
        assert_eq!(current_page(&url, "pagina"), 3);
        assert_eq!(current_page(&url, "page"), 1);

        let url = Url::parse("https://shop.example.com/a?pagina=abc").unwrap();
        assert_eq!(current_page(&url, "pagina"), 1);

        let url = Url::parse("https://shop.example.com/a?pagina=0").unwrap();
        assert_eq!(current_page(&url, "pagina"), 1);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number(" 12 "), Some(12));
        assert_eq!(leading_number("4»"), Some(4));
        assert_eq!(leading_number("»"), None);
        assert_eq!(leading_number(""), None);
    }

    #[tokio::test]
    async fn test_unreadable_document_defaults_to_one() {
        let site = ScriptedSite::new().failing_evaluation("https://shop.example.com/a");
        let mut session = site.session();
        let url = Url::parse("https://shop.example.com/a").unwrap();
        session
            .navigate(&url, std::time::Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(detect_page_count(&session, "pagina").await, 1);
    }

    #[tokio::test]
    async fn test_detached_session_defaults_to_one() {
        let site = ScriptedSite::new();
        let session = site.session();
        assert_eq!(detect_page_count(&session, "pagina").await, 1);
    }
}
