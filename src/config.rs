//! Configuration management for feedwatch using the prefer crate.

use serde::{Deserialize, Serialize};

/// Default number of images per gallery page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default number of log lines kept in the console.
pub const DEFAULT_LOG_RETENTION: usize = 10_000;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the monitoring service.
    pub base_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Path of the log push channel.
    pub websocket_path: String,
    /// Path of the saved-images directory listing.
    pub saved_path: String,
    /// Suffix an anchor must end with to count as an image.
    pub image_suffix: String,
    /// Images per page when the query does not say.
    pub default_page_size: usize,
    /// Maximum log lines kept (None = unbounded).
    pub log_retention: Option<usize>,
    /// Accept the legacy flat `{timestamp, level, payload}` message shape.
    pub accept_flat_log_messages: bool,
    /// Use `{saved_path}{feedId}/` instead of the shared listing.
    pub per_feed_saved_listing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_agent: format!("feedwatch/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 30,
            websocket_path: "/websocket".to_string(),
            saved_path: "/media/saved/".to_string(),
            image_suffix: ".jpg".to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            log_retention: Some(DEFAULT_LOG_RETENTION),
            accept_flat_log_messages: true,
            per_feed_saved_listing: false,
        }
    }
}

impl Settings {
    /// Create settings pointing at a specific service.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Path of the saved-images listing for a feed.
    pub fn saved_listing_path(&self, feed_id: Option<&str>) -> String {
        match feed_id {
            Some(id) if self.per_feed_saved_listing && !id.is_empty() => {
                format!("{}{}/", self.saved_path, urlencoding::encode(id))
            }
            _ => self.saved_path.clone(),
        }
    }

    /// Push channel URL with the http scheme swapped for ws.
    pub fn websocket_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}{}", base.trim_end_matches('/'), self.websocket_path)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the monitoring service.
    #[serde(default)]
    pub url: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    #[serde(default)]
    pub websocket_path: Option<String>,
    #[serde(default)]
    pub saved_path: Option<String>,
    #[serde(default)]
    pub image_suffix: Option<String>,
    #[serde(default)]
    pub images_per_page: Option<usize>,
    /// Maximum log lines kept. 0 means unbounded.
    #[serde(default)]
    pub log_retention: Option<usize>,
    #[serde(default)]
    pub accept_flat_log_messages: Option<bool>,
    #[serde(default)]
    pub per_feed_saved_listing: Option<bool>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers feedwatch config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("feedwatch").await {
            Ok(pref_config) => {
                let url: Option<String> = pref_config.get("url").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let websocket_path: Option<String> =
                    pref_config.get("websocket_path").ok();
                let saved_path: Option<String> = pref_config.get("saved_path").ok();
                let image_suffix: Option<String> = pref_config.get("image_suffix").ok();
                let images_per_page: Option<usize> =
                    pref_config.get("images_per_page").ok();
                let log_retention: Option<usize> = pref_config.get("log_retention").ok();
                let accept_flat_log_messages: Option<bool> =
                    pref_config.get("accept_flat_log_messages").ok();
                let per_feed_saved_listing: Option<bool> =
                    pref_config.get("per_feed_saved_listing").ok();

                Config {
                    url,
                    user_agent,
                    request_timeout,
                    websocket_path,
                    saved_path,
                    image_suffix,
                    images_per_page,
                    log_retention,
                    accept_flat_log_messages,
                    per_feed_saved_listing,
                }
            }
            Err(e) => {
                tracing::debug!("No feedwatch config loaded ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref url) = self.url {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref path) = self.websocket_path {
            settings.websocket_path = path.clone();
        }
        if let Some(ref path) = self.saved_path {
            settings.saved_path = if path.ends_with('/') {
                path.clone()
            } else {
                format!("{}/", path)
            };
        }
        if let Some(ref suffix) = self.image_suffix {
            settings.image_suffix = suffix.clone();
        }
        // A zero page size would make the page count undefined.
        if let Some(size) = self.images_per_page.filter(|&n| n > 0) {
            settings.default_page_size = size;
        }
        if let Some(retention) = self.log_retention {
            settings.log_retention = (retention > 0).then_some(retention);
        }
        if let Some(accept) = self.accept_flat_log_messages {
            settings.accept_flat_log_messages = accept;
        }
        if let Some(per_feed) = self.per_feed_saved_listing {
            settings.per_feed_saved_listing = per_feed;
        }
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}
