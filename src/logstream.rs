//! Log stream consumer for the server push channel.
//!
//! Two message shapes exist on the wire: the current nested one,
//! `{"log": {timestamp, level, payload}}`, and the legacy flat one. Both are
//! decoded into [`LogEvent`] right at the boundary. Each message is decoded
//! on its own, so one bad frame never affects the next.

use std::collections::VecDeque;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};

/// A single log record pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub level: String,
    pub payload: String,
}

impl LogEvent {
    /// Console line: `timestamp [level] payload`.
    pub fn line(&self) -> String {
        format!("{} [{}] {}", self.timestamp, self.level, self.payload)
    }
}

/// Shapes a channel message can take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMessage {
    Nested { log: LogEvent },
    Flat(LogEvent),
    Other(serde_json::Value),
}

/// Decode one channel message.
///
/// `Ok(None)` means valid JSON that carries no log event (or a flat event
/// when `accept_flat` is off). Non-JSON text is a parse error, and so is an
/// object whose `log` field is not a complete event.
pub fn decode_message(text: &str, accept_flat: bool) -> Result<Option<LogEvent>> {
    let message: WireMessage =
        serde_json::from_str(text).map_err(|e| DashboardError::parse("log message", e))?;

    Ok(match message {
        WireMessage::Nested { log } => Some(log),
        WireMessage::Flat(event) if accept_flat => Some(event),
        WireMessage::Flat(_) => {
            debug!("Dropping flat log message, legacy shape disabled");
            None
        }
        WireMessage::Other(value) if value.get("log").is_some() => {
            return Err(DashboardError::parse(
                "log message",
                "log field is not a timestamp/level/payload record",
            ));
        }
        WireMessage::Other(_) => None,
    })
}

/// How many lines the console keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Unbounded,
    MaxLines(usize),
}

impl From<Option<usize>> for Retention {
    fn from(limit: Option<usize>) -> Self {
        match limit {
            Some(n) if n > 0 => Retention::MaxLines(n),
            _ => Retention::Unbounded,
        }
    }
}

/// Where decoded log lines end up.
pub trait LogSurface {
    fn append_line(&mut self, line: &str);

    /// Bring the newest line into view.
    fn scroll_to_end(&mut self) {}
}

/// Append-only line buffer with an optional cap. Oldest lines go first.
#[derive(Debug, Clone)]
pub struct LogConsole {
    lines: VecDeque<String>,
    retention: Retention,
    dropped: usize,
}

impl LogConsole {
    pub fn new(retention: Retention) -> Self {
        Self {
            lines: VecDeque::new(),
            retention,
            dropped: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(Retention::Unbounded)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines evicted by the retention cap so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Whole surface text, newline separated.
    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

impl LogSurface for LogConsole {
    fn append_line(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
        if let Retention::MaxLines(max) = self.retention {
            while self.lines.len() > max {
                self.lines.pop_front();
                self.dropped += 1;
            }
        }
    }
}

/// Lifecycle of the push channel. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What happened to a single inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Appended,
    Ignored,
    Malformed,
}

/// Totals for one channel lifetime.
#[derive(Debug, Default)]
pub struct StreamSummary {
    pub appended: usize,
    pub ignored: usize,
    pub malformed: usize,
    /// Set when the channel ended on an error rather than a close.
    pub error: Option<DashboardError>,
}

pub type LogSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the push channel.
pub async fn connect(url: &str) -> Result<LogSocket> {
    let (socket, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| DashboardError::Channel(format!("connect to {}: {}", url, e)))?;
    info!("Log channel connected to {}", url);
    Ok(socket)
}

/// Feeds channel messages into a [`LogSurface`], in arrival order.
pub struct LogStreamConsumer<S> {
    surface: S,
    accept_flat: bool,
    state: ChannelState,
}

impl<S: LogSurface> LogStreamConsumer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            accept_flat: true,
            state: ChannelState::Connecting,
        }
    }

    /// Pin the protocol to the nested shape only.
    pub fn with_flat_messages(mut self, accept: bool) -> Self {
        self.accept_flat = accept;
        self
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn transition(&mut self, next: ChannelState) {
        if self.state != next {
            debug!("Log channel {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Decode and append one text frame.
    pub fn handle_text(&mut self, text: &str) -> MessageOutcome {
        match decode_message(text, self.accept_flat) {
            Ok(Some(event)) => {
                self.surface.append_line(&event.line());
                self.surface.scroll_to_end();
                MessageOutcome::Appended
            }
            Ok(None) => MessageOutcome::Ignored,
            Err(e) => {
                warn!("Skipping log message: {}", e);
                MessageOutcome::Malformed
            }
        }
    }

    /// Consume the channel until it closes.
    pub async fn run<St>(&mut self, mut stream: St) -> StreamSummary
    where
        St: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
    {
        self.transition(ChannelState::Open);
        let mut summary = StreamSummary::default();

        while let Some(frame) = stream.next().await {
            let outcome = match frame {
                Ok(Message::Text(text)) => self.handle_text(text.as_str()),
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => self.handle_text(text),
                    Err(_) => {
                        warn!("Skipping non UTF-8 binary log frame ({} bytes)", data.len());
                        MessageOutcome::Malformed
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!("Log channel closed by server: {:?}", frame);
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("Log channel dropped: {}", e);
                    summary.error = Some(DashboardError::Channel(e.to_string()));
                    break;
                }
            };

            match outcome {
                MessageOutcome::Appended => summary.appended += 1,
                MessageOutcome::Ignored => summary.ignored += 1,
                MessageOutcome::Malformed => summary.malformed += 1,
            }
        }

        self.transition(ChannelState::Closed);
        info!(
            "Log channel closed after {} lines ({} ignored, {} malformed)",
            summary.appended, summary.ignored, summary.malformed
        );
        summary
    }

    /// Connect to `url` and stream until the channel closes.
    ///
    /// There is no reconnect: a failed connect or a drop leaves the consumer
    /// in [`ChannelState::Closed`] with the error in the summary.
    pub async fn connect_and_run(&mut self, url: &str) -> StreamSummary {
        self.transition(ChannelState::Connecting);
        match connect(url).await {
            Ok(socket) => self.run(socket).await,
            Err(e) => {
                warn!("{}", e);
                self.transition(ChannelState::Closed);
                StreamSummary {
                    error: Some(e),
                    ..Default::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn text(s: &str) -> std::result::Result<Message, tungstenite::Error> {
        Ok(Message::Text(s.into()))
    }

    #[test]
    fn test_decode_nested() {
        let event = decode_message(
            r#"{"log":{"timestamp":"T1","level":"INFO","payload":"x"}}"#,
            false,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.line(), "T1 [INFO] x");
    }

    #[test]
    fn test_decode_flat_depends_on_flag() {
        let flat = r#"{"timestamp":"T2","level":"WARN","payload":"y"}"#;
        assert_eq!(
            decode_message(flat, true).unwrap().map(|e| e.line()),
            Some("T2 [WARN] y".to_string())
        );
        assert_eq!(decode_message(flat, false).unwrap(), None);
    }

    #[test]
    fn test_decode_unrelated_and_garbage() {
        assert_eq!(decode_message(r#"{"notlog":true}"#, true).unwrap(), None);
        assert_eq!(decode_message("[1,2,3]", true).unwrap(), None);

        let err = decode_message("not json at all", true).unwrap_err();
        assert!(matches!(err, DashboardError::Parse { .. }));
    }

    #[test]
    fn test_decode_broken_log_field_is_malformed() {
        for text in [
            r#"{"log":"plain"}"#,
            r#"{"log":{"timestamp":"T","level":"INFO"}}"#,
            r#"{"log":{"timestamp":17,"level":"INFO","payload":"x"}}"#,
        ] {
            let err = decode_message(text, true).unwrap_err();
            assert!(matches!(err, DashboardError::Parse { .. }), "{text}");
        }

        let mut consumer = LogStreamConsumer::new(LogConsole::unbounded());
        let outcome = consumer.handle_text(r#"{"log":{"timestamp":"T","level":"INFO"}}"#);
        assert_eq!(outcome, MessageOutcome::Malformed);
        assert!(consumer.surface().is_empty());
    }

    #[test]
    fn test_console_retention_drops_oldest() {
        let mut console = LogConsole::new(Retention::MaxLines(2));
        for line in ["a", "b", "c"] {
            console.append_line(line);
        }
        assert_eq!(console.lines().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(console.dropped(), 1);
    }

    #[test]
    fn test_console_unbounded() {
        let mut console = LogConsole::new(Retention::from(None));
        for i in 0..500 {
            console.append_line(&i.to_string());
        }
        assert_eq!(console.len(), 500);
        assert_eq!(console.lines().last(), Some("499"));
        assert_eq!(console.dropped(), 0);
        assert_eq!(Retention::from(Some(0)), Retention::Unbounded);
    }

    #[tokio::test]
    async fn test_run_appends_only_log_messages() {
        let frames = stream::iter(vec![
            text(r#"{"log":{"timestamp":"T1","level":"INFO","payload":"x"}}"#),
            text(r#"{"notlog":true}"#),
        ]);
        let mut consumer = LogStreamConsumer::new(LogConsole::unbounded());
        let summary = consumer.run(frames).await;

        assert_eq!(consumer.surface().text(), "T1 [INFO] x");
        assert_eq!(summary.appended, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(consumer.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_malformed_message_does_not_stop_stream() {
        let frames = stream::iter(vec![
            text("{broken"),
            Ok(Message::Binary(vec![0xff, 0xfe].into())),
            Ok(Message::Ping(Vec::new().into())),
            text(r#"{"log":{"timestamp":"T3","level":"ERROR","payload":"z"}}"#),
            Ok(Message::Close(None)),
            text(r#"{"log":{"timestamp":"T4","level":"INFO","payload":"late"}}"#),
        ]);
        let mut consumer = LogStreamConsumer::new(LogConsole::unbounded());
        let summary = consumer.run(frames).await;

        assert_eq!(consumer.surface().text(), "T3 [ERROR] z");
        assert_eq!(summary.malformed, 2);
        assert!(summary.error.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_closes_channel() {
        let frames = stream::iter(vec![
            text(r#"{"timestamp":"T5","level":"INFO","payload":"flat"}"#),
            Err(tungstenite::Error::ConnectionClosed),
        ]);
        let mut consumer = LogStreamConsumer::new(LogConsole::unbounded()).with_flat_messages(true);
        let summary = consumer.run(frames).await;

        assert_eq!(consumer.surface().text(), "T5 [INFO] flat");
        assert!(matches!(summary.error, Some(DashboardError::Channel(_))));
        assert_eq!(consumer.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let mut consumer = LogStreamConsumer::new(LogConsole::unbounded());
        let summary = consumer.connect_and_run("ws://127.0.0.1:1/websocket").await;
        assert!(matches!(summary.error, Some(DashboardError::Channel(_))));
        assert_eq!(consumer.state(), ChannelState::Closed);
    }
}
