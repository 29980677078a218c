//! Feed list loading and the feed selector model.

use tracing::info;

use super::HttpClient;
use crate::error::Result;

/// Endpoint returning the JSON array of feed identifiers.
pub const FEEDS_PATH: &str = "/media/feeds";

/// Fetch the known feed identifiers, in the order the server sent them.
pub async fn load_feeds(client: &HttpClient) -> Result<Vec<String>> {
    let feeds: Vec<String> = client.get_json(FEEDS_PATH, "feed list").await?;
    info!("Loaded {} feeds", feeds.len());
    Ok(feeds)
}

/// One `<option>` of the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOption {
    pub value: String,
    pub label: String,
}

/// Selector with a leading placeholder followed by one option per feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSelector {
    pub options: Vec<FeedOption>,
    /// Index into `options`; 0 is the placeholder.
    pub selected_index: usize,
}

impl FeedSelector {
    pub const PLACEHOLDER: &'static str = "Select a feed";

    /// Build the selector, preselecting `active` when it is one of the feeds.
    pub fn new(feeds: &[String], active: Option<&str>) -> Self {
        let mut options = Vec::with_capacity(feeds.len() + 1);
        options.push(FeedOption {
            value: String::new(),
            label: Self::PLACEHOLDER.to_string(),
        });

        let mut selected_index = 0;
        for (idx, feed) in feeds.iter().enumerate() {
            options.push(FeedOption {
                value: feed.clone(),
                label: feed.clone(),
            });
            if active == Some(feed.as_str()) {
                selected_index = idx + 1;
            }
        }

        Self {
            options,
            selected_index,
        }
    }

    /// Same selector with feeds in ascending order; the selection follows its feed.
    pub fn sorted(&self) -> Self {
        let selected = self.selected().map(|o| o.value.clone());
        let mut feeds: Vec<String> = self.feeds().map(str::to_string).collect();
        feeds.sort();
        Self::new(&feeds, selected.as_deref())
    }

    /// Feed identifiers without the placeholder.
    pub fn feeds(&self) -> impl Iterator<Item = &str> {
        self.options.iter().skip(1).map(|o| o.value.as_str())
    }

    /// Selected feed option, None when the placeholder is selected.
    pub fn selected(&self) -> Option<&FeedOption> {
        if self.selected_index == 0 {
            None
        } else {
            self.options.get(self.selected_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeds(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_preselects_active_feed_after_placeholder() {
        let selector = FeedSelector::new(&feeds(&["porch", "garage", "yard"]), Some("garage"));
        assert_eq!(selector.options.len(), 4);
        assert_eq!(selector.options[0].label, FeedSelector::PLACEHOLDER);
        assert_eq!(selector.selected_index, 2);
        assert_eq!(selector.selected().map(|o| o.value.as_str()), Some("garage"));
    }

    #[test]
    fn test_keeps_server_order() {
        let selector = FeedSelector::new(&feeds(&["zulu", "alpha"]), None);
        assert_eq!(selector.feeds().collect::<Vec<_>>(), vec!["zulu", "alpha"]);
        assert_eq!(selector.selected_index, 0);
        assert!(selector.selected().is_none());
    }

    #[test]
    fn test_unknown_active_feed_selects_placeholder() {
        let selector = FeedSelector::new(&feeds(&["porch"]), Some("attic"));
        assert_eq!(selector.selected_index, 0);
    }

    #[test]
    fn test_sorted_keeps_selection() {
        let selector = FeedSelector::new(&feeds(&["zulu", "mike", "alpha"]), Some("zulu"));
        let sorted = selector.sorted();
        assert_eq!(sorted.feeds().collect::<Vec<_>>(), vec!["alpha", "mike", "zulu"]);
        assert_eq!(sorted.selected_index, 3);
    }
}
