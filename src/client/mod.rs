//! Network side of the dashboard: HTTP fetches against the monitoring service.
//!
//! - [`HttpClient`] wraps reqwest and turns bad statuses into errors
//! - [`load_feeds`] reads the feed list for the selector
//! - [`fetch_saved_entries`] scrapes the saved-images listing
//! - [`HttpClient::snapshot`] pulls one frame off a live/model stream

mod feeds;
mod http_client;
mod mjpeg;
mod saved;

pub use feeds::{load_feeds, FeedOption, FeedSelector, FEEDS_PATH};
pub use http_client::{parse_multipart_boundary, HttpClient, HttpResponse};
pub use mjpeg::MjpegReader;
pub use saved::fetch_saved_entries;
