//! HTML templates for the dashboard views.
//!
//! Renders the index (feed selector, live and model images), the saved-image
//! gallery with its page lists, and the log console. Dynamic text goes
//! through `html_escape`.

use crate::client::FeedSelector;
use crate::feed::PageState;
use crate::gallery::{GalleryPage, NavKind, NavLink, NavModel};
use crate::logstream::LogConsole;
use crate::view::{Degraded, FeedImages, Loaded};

/// Base HTML template.
pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - feedwatch</title>
    <style>{css}</style>
</head>
<body>
    <header id="main-header">
        <nav>
            <a href="/" class="logo">feedwatch</a>
            <a href="/saved">saved images</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#,
        title = html_escape(title),
        css = CSS,
        content = content
    )
}

/// Notice shown where content failed to load.
pub fn degraded_notice(notice: &Degraded) -> String {
    format!(
        r#"<div class="degraded" role="alert"><strong>{}</strong> <span>{}</span></div>"#,
        html_escape(&notice.title),
        html_escape(&notice.detail)
    )
}

/// Render the feed `<select>`.
pub fn feed_selector(selector: &FeedSelector) -> String {
    let mut options = String::new();
    for (idx, option) in selector.options.iter().enumerate() {
        let selected = if idx == selector.selected_index {
            " selected"
        } else {
            ""
        };
        let disabled = if idx == 0 { " disabled" } else { "" };
        options.push_str(&format!(
            r#"<option value="{}"{}{}>{}</option>"#,
            html_escape(&option.value),
            selected,
            disabled,
            html_escape(&option.label)
        ));
    }

    format!(
        r#"<label for="feed-selector">Feed</label>
        <select id="feed-selector" name="feedId" onchange="this.form.submit()">{}</select>"#,
        options
    )
}

/// Live and model image panes.
pub fn feed_images(images: &FeedImages) -> String {
    let name = images.feed_id.as_deref().unwrap_or_default();
    format!(
        r#"
    <section class="feed-views">
        <figure><img id="live-image" src="{live}" alt="live {name}"><figcaption>live</figcaption></figure>
        <figure><img id="model-image" src="{model}" alt="model {name}"><figcaption>model</figcaption></figure>
    </section>
    "#,
        live = html_escape(&images.live_src),
        model = html_escape(&images.model_src),
        name = html_escape(name)
    )
}

/// Selector form. The other query pairs ride along as hidden inputs, so a
/// feed change keeps the gallery position.
pub fn feed_form(selector: &FeedSelector, state: &PageState) -> String {
    let hidden: String = state
        .carried
        .iter()
        .map(|(key, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                html_escape(key),
                html_escape(value)
            )
        })
        .collect();
    format!(
        r#"<form method="get">{}{}</form>"#,
        hidden,
        feed_selector(selector)
    )
}

/// Index page: selector form plus both image views.
pub fn index_page(selector: &Loaded<FeedSelector>, state: &PageState) -> String {
    let selector_html = match selector {
        Loaded::Ready(selector) => feed_form(selector, state),
        Loaded::Degraded(notice) => degraded_notice(notice),
    };
    base_template(
        "Feeds",
        &format!(
            "{}\n{}",
            selector_html,
            feed_images(&FeedImages::new(state))
        ),
    )
}

fn nav_item(link: &NavLink) -> String {
    let href = html_escape(&link.href);
    let label = html_escape(&link.label);
    match link.kind {
        NavKind::Previous | NavKind::Next => format!(
            r#"<li><a href="{}"><span aria-hidden="true">{}</span><span class="visuallyhidden">{}</span></a></li>"#,
            href,
            html_escape(&link.glyph),
            label
        ),
        NavKind::Page => {
            let current = if link.current {
                r#" aria-current="page""#
            } else {
                ""
            };
            format!(
                r#"<li><a href="{}"{}>{}<span class="visuallyhidden">{}</span></a></li>"#,
                href,
                current,
                html_escape(&link.glyph),
                label
            )
        }
    }
}

/// Page list (`<ul>`) for one navigation model.
pub fn nav_list(nav: &NavModel, list_id: &str) -> String {
    let items: String = nav.links().map(nav_item).collect();
    format!(
        r#"<ul id="{}" class="page-list">{}</ul>"#,
        html_escape(list_id),
        items
    )
}

/// Image grid for the visible entries.
pub fn gallery_images(page: &GalleryPage) -> String {
    let mut imgs = String::new();
    for (idx, entry) in page.visible.iter().enumerate() {
        imgs.push_str(&format!(
            r#"<img src="{}" alt="{}" id="saved-image-{}" loading="lazy">"#,
            html_escape(&entry.source_path),
            html_escape(&entry.display_label),
            idx + 1
        ));
    }
    format!(r#"<div id="gallery">{}</div>"#, imgs)
}

/// Saved-images page: count badge, page lists above and below, the grid.
pub fn gallery_page(gallery: &Loaded<GalleryPage>) -> String {
    let content = match gallery {
        Loaded::Ready(page) => {
            let count = page.total_label().unwrap_or_default();
            format!(
                r#"
    <h2>Saved images <span id="total-image-count">{}</span></h2>
    {}
    {}
    {}
    "#,
                count,
                nav_list(&page.navigation, "page-list-top"),
                gallery_images(page),
                nav_list(&page.navigation, "page-list-bottom")
            )
        }
        Loaded::Degraded(notice) => degraded_notice(notice),
    };
    base_template("Saved images", &content)
}

/// Log console snapshot.
pub fn log_console(console: &LogConsole) -> String {
    let dropped = if console.dropped() > 0 {
        format!(
            r#"<p class="log-dropped">{} older lines discarded</p>"#,
            console.dropped()
        )
    } else {
        String::new()
    };
    format!(
        r#"{}<pre id="logs">{}</pre>"#,
        dropped,
        html_escape(&console.text())
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// CSS styles for the dashboard - minimal text-based design.
pub const CSS: &str = r#"
:root {
    --bg: #fff;
    --text: #222;
    --text-muted: #666;
    --link: #0066cc;
    --border: #ccc;
    --warn-bg: #fff4e5;
}
body { font-family: monospace; background: var(--bg); color: var(--text); margin: 0 1rem; }
a { color: var(--link); }
.visuallyhidden {
    position: absolute;
    width: 1px;
    height: 1px;
    overflow: hidden;
    clip: rect(0 0 0 0);
    white-space: nowrap;
}
.page-list { list-style: none; display: flex; gap: 0.5rem; padding: 0; }
.page-list a[aria-current="page"] { font-weight: bold; text-decoration: none; }
#gallery { display: flex; flex-wrap: wrap; gap: 0.5rem; }
#gallery img { max-width: 320px; border: 1px solid var(--border); }
.feed-views { display: flex; gap: 1rem; }
.feed-views img { max-width: 100%; }
#logs { height: 20rem; overflow-y: scroll; border: 1px solid var(--border); padding: 0.5rem; }
.degraded { background: var(--warn-bg); border: 1px solid var(--border); padding: 0.5rem; }
.log-dropped { color: var(--text-muted); }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::paginate;
    use crate::listing::ImageEntry;
    use crate::logstream::{LogSurface, Retention};

    #[test]
    fn test_nav_list_middle_page() {
        let html = nav_list(&NavModel::new(2, 3, 20), "page-list-top");

        assert!(html.starts_with(r#"<ul id="page-list-top""#));
        assert!(html.contains(r#"<a href="?page=1&amp;imgsPerPage=20"><span aria-hidden="true">«</span><span class="visuallyhidden">previous page</span></a>"#));
        assert!(html.contains(r#"<a href="?page=2&amp;imgsPerPage=20" aria-current="page">2<span class="visuallyhidden">page</span></a>"#));
        assert!(html.contains(r#"<span class="visuallyhidden">next page</span>"#));
        assert_eq!(html.matches("aria-current").count(), 1);
        assert_eq!(html.matches("<li>").count(), 5);
    }

    #[test]
    fn test_gallery_page_ids_and_escaping() {
        let entries = vec![
            ImageEntry::new("/media/saved/a.jpg", "a.jpg"),
            ImageEntry::new("/media/saved/b.jpg", "<b>.jpg"),
        ];
        let html = gallery_page(&Loaded::Ready(paginate(entries, 0, 20)));

        assert!(html.contains(r#"<span id="total-image-count">(2)</span>"#));
        assert!(html.contains(r#"alt="&lt;b&gt;.jpg" id="saved-image-1""#));
        assert!(html.contains(r#"src="/media/saved/a.jpg" alt="a.jpg" id="saved-image-2""#));
        assert!(html.contains(r#"id="page-list-bottom""#));
    }

    #[test]
    fn test_gallery_page_degraded() {
        let html = gallery_page(&Loaded::Degraded(Degraded {
            title: "Unable to load images".to_string(),
            detail: "server responded with status 500".to_string(),
        }));
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains("Unable to load images"));
        assert!(!html.contains("id=\"gallery\""));
    }

    #[test]
    fn test_feed_selector_marks_active() {
        let feeds = vec!["porch".to_string(), "garage".to_string()];
        let html = feed_selector(&FeedSelector::new(&feeds, Some("garage")));
        assert!(html.contains(r#"<option value="garage" selected>garage</option>"#));
        assert!(html.contains(r#"<option value="" disabled>Select a feed</option>"#));
    }

    #[test]
    fn test_feed_change_keeps_gallery_position() {
        let feeds = vec!["porch".to_string(), "garage".to_string()];
        let state = PageState::from_query("?page=3&feedId=porch&imgsPerPage=10&q=a%22b", 20);
        let selector = Loaded::Ready(FeedSelector::new(&feeds, state.feed_id()));
        let html = index_page(&selector, &state);

        assert!(html.contains(r#"<input type="hidden" name="page" value="3">"#));
        assert!(html.contains(r#"<input type="hidden" name="imgsPerPage" value="10">"#));
        assert!(html.contains(r#"<input type="hidden" name="q" value="a&quot;b">"#));
        assert!(!html.contains(r#"type="hidden" name="feedId""#));
        assert_eq!(html.matches(r#"name="feedId""#).count(), 1);
        assert!(html.contains(r#"src="/media/live/porch""#));
    }

    #[test]
    fn test_log_console_escapes_payload() {
        let mut console = LogConsole::new(Retention::MaxLines(1));
        console.append_line("T1 [INFO] old");
        console.append_line("T2 [INFO] <script>");
        let html = log_console(&console);
        assert!(html.contains("T2 [INFO] &lt;script&gt;"));
        assert!(html.contains("1 older lines discarded"));
    }
}
