//! Single-frame capture from the live and model image streams.
//!
//! Both streams are `multipart/x-mixed-replace`: every part starts with the
//! boundary marker, carries `Content-Type: image/jpeg` and `Content-Length`
//! headers, then the JPEG bytes.

use tracing::debug;

use super::HttpClient;
use crate::error::{DashboardError, Result};

/// Incremental frame splitter for a multipart JPEG stream.
#[derive(Debug)]
pub struct MjpegReader {
    marker: Vec<u8>,
    buffer: Vec<u8>,
}

impl MjpegReader {
    /// `boundary` is the value from the Content-Type header.
    pub fn new(boundary: &str) -> Self {
        let marker = if boundary.starts_with("--") {
            boundary.to_string()
        } else {
            format!("--{}", boundary)
        };
        Self {
            marker: marker.into_bytes(),
            buffer: Vec::new(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let start = find(&self.buffer, &self.marker)?;
        let header_start = start + self.marker.len();
        let header_end = header_start + find(&self.buffer[header_start..], b"\r\n\r\n")?;
        let body_start = header_end + 4;

        let headers = String::from_utf8_lossy(&self.buffer[header_start..header_end]);
        let body_end = match content_length(&headers) {
            Some(len) => {
                let end = body_start + len;
                if self.buffer.len() < end {
                    return None;
                }
                end
            }
            None => {
                // No length: the part runs until the next marker.
                let next = body_start + find(&self.buffer[body_start..], &self.marker)?;
                trim_crlf_end(&self.buffer[..next], body_start)
            }
        };

        let frame = self.buffer[body_start..body_end].to_vec();
        self.buffer.drain(..body_end);
        Some(frame)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(headers: &str) -> Option<usize> {
    headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
}

fn trim_crlf_end(buf: &[u8], floor: usize) -> usize {
    let mut end = buf.len();
    while end > floor && matches!(buf[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    end
}

impl HttpClient {
    /// Grab one JPEG frame from an image stream path.
    ///
    /// A plain `image/*` response is returned whole.
    pub async fn snapshot(&self, path: &str) -> Result<Vec<u8>> {
        let mut response = self.get(path).await?;

        let Some(boundary) = response.multipart_boundary() else {
            debug!("{} is not multipart, reading body as one image", path);
            return response.bytes().await;
        };

        let mut reader = MjpegReader::new(&boundary);
        while let Some(chunk) = response.chunk().await? {
            reader.push(&chunk);
            if let Some(frame) = reader.next_frame() {
                debug!("Captured {} byte frame from {}", frame.len(), path);
                return Ok(frame);
            }
        }

        Err(DashboardError::parse(
            "image stream",
            "stream ended before a complete frame",
        ))
    }
}
