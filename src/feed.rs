//! Feed identity resolution and the immutable per-load page state.
//!
//! Everything here is a pure function of the query string. An absent feed is
//! a normal state: image paths end in an empty segment instead of failing.

use url::form_urlencoded;
use url::Url;

use crate::error::{DashboardError, Result};
use crate::gallery::GalleryQuery;

/// Query parameter carrying the active feed.
pub const FEED_ID_PARAM: &str = "feedId";

/// Everything one page load reads from its URL, captured once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub feed_id: Option<String>,
    pub gallery: GalleryQuery,
    /// Every other query pair, in order. Kept across a feed change.
    pub carried: Vec<(String, String)>,
}

impl PageState {
    pub fn from_query(query: &str, default_page_size: usize) -> Self {
        Self {
            feed_id: resolve(query),
            gallery: GalleryQuery::from_query(query, default_page_size),
            carried: query_pairs(query)
                .filter(|(key, _)| key != FEED_ID_PARAM)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        }
    }

    pub fn feed_id(&self) -> Option<&str> {
        self.feed_id.as_deref()
    }

    pub fn live_image_path(&self) -> String {
        live_image_path(self.feed_id())
    }

    pub fn model_image_path(&self) -> String {
        model_image_path(self.feed_id())
    }
}

/// Iterate decoded `key=value` pairs of a query string (leading `?` optional).
pub(crate) fn query_pairs(query: &str) -> form_urlencoded::Parse<'_> {
    form_urlencoded::parse(query.strip_prefix('?').unwrap_or(query).as_bytes())
}

/// First value of a named query parameter.
pub(crate) fn query_param(query: &str, name: &str) -> Option<String> {
    query_pairs(query)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Extract the active feed identifier from a query string.
///
/// `feedId=` with no value resolves to an empty identifier, not to `None`.
pub fn resolve(query: &str) -> Option<String> {
    query_param(query, FEED_ID_PARAM)
}

/// Path of the live image stream for a feed.
pub fn live_image_path(feed_id: Option<&str>) -> String {
    media_path("live", feed_id)
}

/// Path of the model-output image stream for a feed.
pub fn model_image_path(feed_id: Option<&str>) -> String {
    media_path("model", feed_id)
}

fn media_path(kind: &str, feed_id: Option<&str>) -> String {
    format!(
        "/media/{}/{}",
        kind,
        urlencoding::encode(feed_id.unwrap_or_default())
    )
}

/// Rewrite `current_url` so its `feedId` parameter names `feed_id`.
///
/// Other query parameters are kept in their original order.
pub fn select_feed_url(current_url: &str, feed_id: &str) -> Result<String> {
    let mut url = Url::parse(current_url).map_err(|source| DashboardError::InvalidUrl {
        url: current_url.to_string(),
        source,
    })?;

    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(key, value)| {
            if key == FEED_ID_PARAM {
                if replaced {
                    return None;
                }
                replaced = true;
                Some((key.into_owned(), feed_id.to_string()))
            } else {
                Some((key.into_owned(), value.into_owned()))
            }
        })
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
        if !replaced {
            query.append_pair(FEED_ID_PARAM, feed_id);
        }
    }

    Ok(url.to_string())
}
