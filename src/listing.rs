//! Directory listing parser.
//!
//! The saved-images endpoint answers with a server-rendered index page. Every
//! anchor whose (resolved) href ends with the image suffix becomes an entry.

use std::fmt;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// One image found in a directory listing.
///
/// Ordering compares the source path first, which is also the entry's
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageEntry {
    /// Path the image is fetched from (`base_path` + file name).
    pub source_path: String,
    /// Full href of the anchor, used as alt text.
    pub display_label: String,
}

impl ImageEntry {
    pub fn new(source_path: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            display_label: display_label.into(),
        }
    }

    /// File name part of the source path.
    pub fn file_name(&self) -> &str {
        last_path_segment(&self.source_path)
    }
}

impl fmt::Display for ImageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_path)
    }
}

/// Parse a listing using raw href values.
pub fn parse_listing(html: &str, base_path: &str, suffix: &str) -> Vec<ImageEntry> {
    parse_listing_at(html, None, base_path, suffix)
}

/// Parse a listing, resolving each href against the URL the listing came from.
///
/// Hrefs are matched on their full resolved form; anchors pointing at other
/// hosts are kept if the suffix matches. Recovered markup errors are logged,
/// malformed input simply yields fewer (or no) entries.
pub fn parse_listing_at(
    html: &str,
    document_url: Option<&Url>,
    base_path: &str,
    suffix: &str,
) -> Vec<ImageEntry> {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        debug!(
            "Directory listing parsed with {} recovered markup errors",
            document.errors.len()
        );
    }

    let selector = Selector::parse("a[href]").expect("valid anchor selector");

    let entries: Vec<ImageEntry> = document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| resolve_href(document_url, href))
        .filter(|href| href.ends_with(suffix))
        .map(|href| {
            let source_path = format!("{}{}", base_path, last_path_segment(&href));
            ImageEntry::new(source_path, href)
        })
        .collect();

    debug!("Directory listing yielded {} entries", entries.len());
    entries
}

fn resolve_href(document_url: Option<&Url>, href: &str) -> String {
    match document_url {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<li><a href="{h}">{h}</a></li>"#))
            .collect();
        format!("<html><body><h1>Index of /media/saved/</h1><ul>{anchors}</ul></body></html>")
    }

    #[test]
    fn test_filters_by_suffix_in_source_order() {
        let html = listing(&["a.jpg", "b.png", "c.jpg"]);
        let entries = parse_listing(&html, "/media/saved/", ".jpg");

        assert_eq!(
            entries,
            vec![
                ImageEntry::new("/media/saved/a.jpg", "a.jpg"),
                ImageEntry::new("/media/saved/c.jpg", "c.jpg"),
            ]
        );
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let html = listing(&["upper.JPG", "lower.jpg", "jpg", "x.jpg?v=1"]);
        let entries = parse_listing(&html, "/media/saved/", ".jpg");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name(), "lower.jpg");
    }

    #[test]
    fn test_label_keeps_full_href() {
        let html = listing(&["2024/05/01/cam1-120000.jpg"]);
        let entries = parse_listing(&html, "/media/saved/", ".jpg");
        assert_eq!(entries[0].source_path, "/media/saved/cam1-120000.jpg");
        assert_eq!(entries[0].display_label, "2024/05/01/cam1-120000.jpg");
    }

    #[test]
    fn test_resolves_against_document_url() {
        let base = Url::parse("http://cam.local:8080/media/saved/").unwrap();
        let html = listing(&["one.jpg", "../other.jpg", "https://elsewhere.net/x.jpg"]);
        let entries = parse_listing_at(&html, Some(&base), "/media/saved/", ".jpg");

        let labels: Vec<&str> = entries.iter().map(|e| e.display_label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "http://cam.local:8080/media/saved/one.jpg",
                "http://cam.local:8080/media/other.jpg",
                "https://elsewhere.net/x.jpg",
            ]
        );
        assert_eq!(entries[2].source_path, "/media/saved/x.jpg");
    }

    #[test]
    fn test_malformed_markup_does_not_panic() {
        let entries = parse_listing("<a href=\"ok.jpg\"><<<div></p>", "/s/", ".jpg");
        assert_eq!(entries.len(), 1);

        assert!(parse_listing("", "/s/", ".jpg").is_empty());
        assert!(parse_listing("{\"not\": \"html\"}", "/s/", ".jpg").is_empty());
    }

    #[test]
    fn test_anchor_without_href_is_skipped() {
        let entries = parse_listing("<a name=\"top.jpg\">top</a>", "/s/", ".jpg");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_display_is_source_path() {
        let entry = ImageEntry::new("/media/saved/a.jpg", "a.jpg");
        assert_eq!(entry.to_string(), "/media/saved/a.jpg");
    }
}
