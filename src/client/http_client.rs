//! HTTP client for the monitoring service.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::error::{DashboardError, Result};

/// HTTP client bound to one service base URL.
///
/// Every request is a single attempt; failures are returned, never retried.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.request_timeout))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a service path (e.g. `/media/feeds`) to a full URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|source| DashboardError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    /// GET a path. Non-2xx responses become [`DashboardError::Fetch`].
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.url(path)?;

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let duration = start.elapsed();

        let status = response.status();
        let final_url = response.url().clone();
        debug!(
            "GET {} -> {} {} in {}ms",
            url,
            final_url,
            status.as_u16(),
            duration.as_millis()
        );

        if !status.is_success() {
            return Err(DashboardError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        Ok(HttpResponse {
            status,
            url: final_url,
            headers,
            response,
        })
    }

    /// Get page content as text.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }

    /// Get a JSON document. A body that does not decode is a parse error.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let body = self.get_text(path).await?;
        serde_json::from_str(&body).map_err(|e| DashboardError::parse(context, e))
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    // Service paths are absolute, so any path on the base is replaced.
    Url::parse(base_url).map_err(|source| DashboardError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })
}

/// Successful HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    /// Final URL the response came from, after redirects.
    pub url: Url,
    pub headers: HashMap<String, String>,
    response: Response,
}

impl HttpResponse {
    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Multipart boundary declared in the Content-Type header.
    pub fn multipart_boundary(&self) -> Option<String> {
        self.content_type().and_then(parse_multipart_boundary)
    }

    /// Next chunk of the body, None at end of stream.
    pub async fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.response.chunk().await?.map(|b| b.to_vec()))
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        Ok(self.response.bytes().await?.to_vec())
    }

    /// Get response body as text.
    pub async fn text(self) -> std::result::Result<String, reqwest::Error> {
        self.response.text().await
    }
}

/// Extract `boundary=...` from a `multipart/*` content type.
pub fn parse_multipart_boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    let mime = parts.next()?.trim();
    if !mime.to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }
    parts
        .filter_map(|p| p.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let client = HttpClient::new(&Settings::with_base_url("http://cam.local:8080")).unwrap();
        assert_eq!(
            client.url("/media/feeds").unwrap().as_str(),
            "http://cam.local:8080/media/feeds"
        );
        assert_eq!(
            client.url("/media/live/cam%201").unwrap().as_str(),
            "http://cam.local:8080/media/live/cam%201"
        );
    }

    #[test]
    fn test_base_path_is_replaced() {
        let client =
            HttpClient::new(&Settings::with_base_url("http://cam.local:8080/dash/")).unwrap();
        assert_eq!(
            client.url("/media/feeds").unwrap().as_str(),
            "http://cam.local:8080/media/feeds"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpClient::new(&Settings::with_base_url("no scheme here")).err();
        assert!(matches!(err, Some(DashboardError::InvalidUrl { .. })));
    }

    #[test]
    fn test_parse_multipart_boundary() {
        assert_eq!(
            parse_multipart_boundary("multipart/x-mixed-replace; boundary=--boundary"),
            Some("--boundary".to_string())
        );
        assert_eq!(
            parse_multipart_boundary(r#"multipart/x-mixed-replace;boundary="frame""#),
            Some("frame".to_string())
        );
        assert_eq!(parse_multipart_boundary("image/jpeg"), None);
        assert_eq!(parse_multipart_boundary("multipart/mixed"), None);
    }
}
