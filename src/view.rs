//! View models handed to the renderers.
//!
//! Fetch results arrive here as `Result`s and leave as [`Loaded`] values, so a
//! failed request always turns into something the user can see.

use tracing::warn;

use crate::client::FeedSelector;
use crate::error::{DashboardError, Result};
use crate::feed::PageState;
use crate::gallery::GalleryPage;
use crate::listing::ImageEntry;

/// Notice shown in place of content that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded {
    pub title: String,
    pub detail: String,
}

/// Content that either loaded or degraded to a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Ready(T),
    Degraded(Degraded),
}

impl<T> Loaded<T> {
    /// Convert a fetch result. `what` completes "unable to load ...".
    pub fn from_result(result: Result<T>, what: &str) -> Self {
        match result {
            Ok(value) => Loaded::Ready(value),
            Err(e) => Loaded::Degraded(degrade(&e, what)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        match self {
            Loaded::Ready(value) => Loaded::Ready(f(value)),
            Loaded::Degraded(d) => Loaded::Degraded(d),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loaded::Ready(value) => Some(value),
            Loaded::Degraded(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Loaded::Degraded(_))
    }
}

fn degrade(error: &DashboardError, what: &str) -> Degraded {
    warn!("Unable to load {}: {}", what, error);
    Degraded {
        title: format!("Unable to load {}", what),
        detail: error.user_message(),
    }
}

/// Image sources for the live and model views of the active feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImages {
    pub feed_id: Option<String>,
    pub live_src: String,
    pub model_src: String,
}

impl FeedImages {
    pub fn new(state: &PageState) -> Self {
        Self {
            feed_id: state.feed_id.clone(),
            live_src: state.live_image_path(),
            model_src: state.model_image_path(),
        }
    }
}

/// Build the selector view from the feed-list fetch.
pub fn feed_selector_view(feeds: Result<Vec<String>>, state: &PageState) -> Loaded<FeedSelector> {
    Loaded::from_result(feeds, "feeds").map(|feeds| FeedSelector::new(&feeds, state.feed_id()))
}

/// Build the gallery view from the listing fetch.
///
/// Pagination only runs on a successful, already filtered listing.
pub fn gallery_view(entries: Result<Vec<ImageEntry>>, state: &PageState) -> Loaded<GalleryPage> {
    Loaded::from_result(entries, "images").map(|entries| state.gallery.paginate(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_degrades() {
        let state = PageState::from_query("?page=1", 20);
        let view = gallery_view(
            Err(DashboardError::Fetch {
                url: "http://localhost/media/saved/".to_string(),
                status: 404,
            }),
            &state,
        );

        match view {
            Loaded::Degraded(d) => {
                assert_eq!(d.title, "Unable to load images");
                assert_eq!(d.detail, "server responded with status 404");
            }
            Loaded::Ready(_) => panic!("expected degraded view"),
        }
    }

    #[test]
    fn test_gallery_view_paginates() {
        let state = PageState::from_query("?page=2&imgsPerPage=1", 20);
        let entries = vec![
            ImageEntry::new("/media/saved/a.jpg", "a.jpg"),
            ImageEntry::new("/media/saved/b.jpg", "b.jpg"),
        ];
        let page = gallery_view(Ok(entries), &state);
        let page = page.ready().unwrap();
        assert_eq!(page.page_count, 2);
        assert_eq!(page.visible[0].display_label, "a.jpg");
    }

    #[test]
    fn test_feed_selector_view() {
        let state = PageState::from_query("?feedId=b", 20);
        let view = feed_selector_view(Ok(vec!["a".to_string(), "b".to_string()]), &state);
        assert_eq!(view.ready().map(|s| s.selected_index), Some(2));

        let view = feed_selector_view(Err(DashboardError::parse("feed list", "eof")), &state);
        assert!(view.is_degraded());
    }

    #[test]
    fn test_feed_images_without_feed() {
        let images = FeedImages::new(&PageState::from_query("", 20));
        assert_eq!(images.live_src, "/media/live/");
        assert_eq!(images.model_src, "/media/model/");
    }
}
