//! Pagination of saved images.
//!
//! Page 0 is the landing view and shows every entry. Pages from 1 up slice
//! the sorted collection; a page past the end is simply empty.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::feed::query_param;
use crate::listing::ImageEntry;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "imgsPerPage";

/// Gallery position requested by the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryQuery {
    /// 0 = show everything.
    pub page: usize,
    /// Always > 0.
    pub page_size: usize,
}

impl Default for GalleryQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl GalleryQuery {
    /// Read `page` and `imgsPerPage`. Missing, empty, non-numeric, zero and
    /// negative values all mean "use the default".
    pub fn from_query(query: &str, default_page_size: usize) -> Self {
        let default_page_size = if default_page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            default_page_size
        };
        Self {
            page: parse_count(query_param(query, PAGE_PARAM).as_deref()).unwrap_or(0),
            page_size: parse_count(query_param(query, PAGE_SIZE_PARAM).as_deref())
                .unwrap_or(default_page_size),
        }
    }

    pub fn paginate(&self, entries: Vec<ImageEntry>) -> GalleryPage {
        paginate(entries, self.page, self.page_size)
    }
}

/// A positive count in numeric-literal form (`3`, `3.0`, `1e1`).
///
/// Fractions are floored and values past `usize::MAX` saturate. Anything
/// below 1, NaN included, gives None.
fn parse_count(raw: Option<&str>) -> Option<usize> {
    let value = raw?.trim().parse::<f64>().ok()?;
    if value.is_nan() || value < 1.0 {
        return None;
    }
    Some(value as usize)
}

/// Query string a navigation link points at.
pub fn page_href(page: i64, page_size: usize) -> String {
    format!("?{}={}&{}={}", PAGE_PARAM, page, PAGE_SIZE_PARAM, page_size)
}

/// Sort entries newest-first, assuming names grow lexicographically with time.
pub fn sort_entries(entries: &mut [ImageEntry]) {
    entries.sort_by(|a, b| b.cmp(a));
}

/// Number of pages needed for `count` entries.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    Previous,
    Page,
    Next,
}

/// One pagination control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub kind: NavKind,
    /// Page the link leads to. Can be -1 for "previous" on the landing view.
    pub target: i64,
    pub href: String,
    /// What is drawn.
    pub glyph: String,
    /// What assistive technology reads.
    pub label: String,
    /// Marks the link for the page being shown.
    pub current: bool,
}

/// Previous / numbered / next controls for one gallery page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavModel {
    pub previous: Option<NavLink>,
    pub pages: Vec<NavLink>,
    pub next: Option<NavLink>,
}

impl NavModel {
    pub fn new(page: usize, page_count: usize, page_size: usize) -> Self {
        let page_i = i64::try_from(page).unwrap_or(i64::MAX);
        let count_i = i64::try_from(page_count).unwrap_or(i64::MAX);

        let previous = (page_count > 1 && page != 1).then(|| NavLink {
            kind: NavKind::Previous,
            target: page_i.saturating_sub(1),
            href: page_href(page_i.saturating_sub(1), page_size),
            glyph: "\u{ab}".to_string(),
            label: "previous page".to_string(),
            current: false,
        });

        let pages = (1..=count_i)
            .map(|n| NavLink {
                kind: NavKind::Page,
                target: n,
                href: page_href(n, page_size),
                glyph: n.to_string(),
                label: "page".to_string(),
                current: n == page_i,
            })
            .collect();

        let next = (page_count > 1 && page != page_count).then(|| NavLink {
            kind: NavKind::Next,
            target: page_i.saturating_add(1),
            href: page_href(page_i.saturating_add(1), page_size),
            glyph: "\u{bb}".to_string(),
            label: "next page".to_string(),
            current: false,
        });

        Self {
            previous,
            pages,
            next,
        }
    }

    /// All links in display order.
    pub fn links(&self) -> impl Iterator<Item = &NavLink> {
        self.previous
            .iter()
            .chain(self.pages.iter())
            .chain(self.next.iter())
    }

    pub fn current(&self) -> Option<&NavLink> {
        self.pages.iter().find(|l| l.current)
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.pages.is_empty() && self.next.is_none()
    }
}

/// Result of paginating one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryPage {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Number of entries before slicing.
    pub total: usize,
    pub visible: Vec<ImageEntry>,
    pub navigation: NavModel,
}

impl GalleryPage {
    /// `(n)` badge shown next to the gallery title, empty when there is nothing.
    pub fn total_label(&self) -> Option<String> {
        (self.total > 0).then(|| format!("({})", self.total))
    }
}

/// Sort, count and slice a listing.
pub fn paginate(mut entries: Vec<ImageEntry>, page: usize, page_size: usize) -> GalleryPage {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };

    sort_entries(&mut entries);

    let total = entries.len();
    let count = page_count(total, page_size);

    let visible = if page == 0 {
        entries
    } else {
        let start = (page - 1).saturating_mul(page_size);
        if start >= total {
            Vec::new()
        } else {
            let end = page.saturating_mul(page_size).min(total);
            entries.drain(start..end).collect()
        }
    };

    GalleryPage {
        page,
        page_size,
        page_count: count,
        total,
        visible,
        navigation: NavModel::new(page, count, page_size),
    }
}
