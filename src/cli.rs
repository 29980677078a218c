//! Command-line interface.
//!
//! One invocation plays the part of one page load: the query string is read
//! once into a [`PageState`], fetches run, results are rendered.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use url::Url;

use crate::client::{fetch_saved_entries, load_feeds, FeedSelector, HttpClient};
use crate::config::{load_settings, Settings};
use crate::feed::{select_feed_url, PageState};
use crate::gallery::{GalleryPage, NavKind, NavModel};
use crate::logstream::{LogConsole, LogStreamConsumer, LogSurface, Retention, StreamSummary};
use crate::templates;
use crate::view::{feed_selector_view, gallery_view, Degraded, FeedImages, Loaded};

#[derive(Parser, Debug)]
#[command(name = "feedwatch", version, about = "Camera feed monitoring dashboard client")]
pub struct Cli {
    /// Base URL of the monitoring service
    #[arg(long, env = "FEEDWATCH_URL", global = true)]
    pub url: Option<String>,

    /// Page query string, e.g. "?feedId=porch&page=2&imgsPerPage=10"
    #[arg(long, short, default_value = "", global = true)]
    pub query: String,

    /// Active feed (overrides feedId in the query)
    #[arg(long, global = true)]
    pub feed: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List feeds, marking the active one
    Feeds {
        /// Sort feeds by name instead of server order
        #[arg(long)]
        sorted: bool,
        /// Print the dashboard link that switches to each feed
        #[arg(long)]
        links: bool,
    },
    /// Show image URLs for the active feed
    View,
    /// Save one frame of the active feed
    Snapshot {
        /// Capture the model output instead of the live image
        #[arg(long)]
        model: bool,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Show a page of saved images
    Gallery {
        /// Write the gallery page as HTML instead of printing it
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Stream server log lines until the channel closes
    Logs {
        #[arg(long, conflicts_with = "unbounded")]
        max_lines: Option<usize>,
        /// Keep every line
        #[arg(long)]
        unbounded: bool,
        /// Ignore legacy flat log messages
        #[arg(long)]
        nested_only: bool,
        /// Write the retained console as HTML once the channel closes
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Load feeds and gallery together, then stream logs
    Dashboard {
        /// Directory for index.html, saved.html and logs.html
        #[arg(long)]
        html_dir: Option<PathBuf>,
    },
}

/// Log surface that echoes to the terminal and keeps a retained copy.
pub struct TerminalSurface<W: Write> {
    console: LogConsole,
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(retention: Retention, out: W) -> Self {
        Self {
            console: LogConsole::new(retention),
            out,
        }
    }

    pub fn console(&self) -> &LogConsole {
        &self.console
    }
}

impl<W: Write> LogSurface for TerminalSurface<W> {
    fn append_line(&mut self, line: &str) {
        self.console.append_line(line);
        // A closed stdout should not stop the stream.
        let _ = writeln!(self.out, "{}", line);
    }

    fn scroll_to_end(&mut self) {
        let _ = self.out.flush();
    }
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = load_settings().await;
    if let Some(ref url) = cli.url {
        settings.base_url = url.trim_end_matches('/').to_string();
    }

    let mut state = PageState::from_query(&cli.query, settings.default_page_size);
    if let Some(feed) = cli.feed {
        state.feed_id = Some(feed);
    }

    let client = HttpClient::new(&settings)?;
    info!("Using service at {}", client.base_url());

    match cli.command {
        Command::Feeds { sorted, links } => {
            let selector = feed_selector_view(load_feeds(&client).await, &state);
            let selector = if sorted {
                selector.map(|s| s.sorted())
            } else {
                selector
            };
            match selector {
                Loaded::Ready(ref ready) if links => {
                    for (feed, link) in feed_links(client.base_url(), &cli.query, ready)? {
                        println!("{}\t{}", feed, link);
                    }
                }
                _ => print!("{}", render_selector_text(&selector)),
            }
        }
        Command::View => {
            let images = FeedImages::new(&state);
            println!("live:  {}", client.url(&images.live_src)?);
            println!("model: {}", client.url(&images.model_src)?);
        }
        Command::Snapshot { model, out } => {
            let path = if model {
                state.model_image_path()
            } else {
                state.live_image_path()
            };
            match client.snapshot(&path).await {
                Ok(frame) => {
                    std::fs::write(&out, &frame)?;
                    println!("saved {} bytes to {}", frame.len(), out.display());
                }
                Err(e) => println!(
                    "{}",
                    render_degraded_text(&Loaded::<()>::from_result(Err(e), "image"))
                ),
            }
        }
        Command::Gallery { html } => {
            let entries = fetch_saved_entries(&client, &settings, state.feed_id()).await;
            let gallery = gallery_view(entries, &state);
            match html {
                Some(path) => write_html(&path, &templates::gallery_page(&gallery))?,
                None => print!("{}", render_gallery_text(&gallery)),
            }
        }
        Command::Logs {
            max_lines,
            unbounded,
            nested_only,
            html,
        } => {
            if let Some(n) = max_lines {
                settings.log_retention = Some(n);
            }
            if unbounded {
                settings.log_retention = None;
            }
            if nested_only {
                settings.accept_flat_log_messages = false;
            }
            let (console, summary) = stream_logs(&settings).await;
            report_stream_end(&summary);
            if let Some(path) = html {
                write_html(&path, &templates::base_template("Logs", &templates::log_console(&console)))?;
            }
        }
        Command::Dashboard { html_dir } => {
            let (feeds, entries) = tokio::join!(
                load_feeds(&client),
                fetch_saved_entries(&client, &settings, state.feed_id())
            );
            let selector = feed_selector_view(feeds, &state);
            let gallery = gallery_view(entries, &state);

            print!("{}", render_selector_text(&selector));
            print!("{}", render_gallery_text(&gallery));

            if let Some(ref dir) = html_dir {
                std::fs::create_dir_all(dir)?;
                write_html(&dir.join("index.html"), &templates::index_page(&selector, &state))?;
                write_html(&dir.join("saved.html"), &templates::gallery_page(&gallery))?;
            }

            let (console, summary) = stream_logs(&settings).await;
            report_stream_end(&summary);
            if let Some(ref dir) = html_dir {
                write_html(
                    &dir.join("logs.html"),
                    &templates::base_template("Logs", &templates::log_console(&console)),
                )?;
            }
        }
    }

    Ok(())
}

async fn stream_logs(settings: &Settings) -> (LogConsole, StreamSummary) {
    let surface = TerminalSurface::new(settings.log_retention.into(), std::io::stdout());
    let mut consumer =
        LogStreamConsumer::new(surface).with_flat_messages(settings.accept_flat_log_messages);
    let summary = consumer.connect_and_run(&settings.websocket_url()).await;
    (consumer.into_surface().console, summary)
}

fn report_stream_end(summary: &StreamSummary) {
    if let Some(ref e) = summary.error {
        eprintln!("log stream stopped: {}", e.user_message());
    } else {
        eprintln!("log stream closed by server");
    }
}

fn write_html(path: &Path, html: &str) -> std::io::Result<()> {
    std::fs::write(path, html)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Page URL for every feed, keeping the rest of the current query.
fn feed_links(
    base_url: &Url,
    query: &str,
    selector: &FeedSelector,
) -> crate::Result<Vec<(String, String)>> {
    let mut page_url = base_url.clone();
    let query = query.trim_start_matches('?');
    page_url.set_query((!query.is_empty()).then_some(query));
    selector
        .feeds()
        .map(|feed| select_feed_url(page_url.as_str(), feed).map(|link| (feed.to_string(), link)))
        .collect()
}

fn render_degraded_text<T>(loaded: &Loaded<T>) -> String {
    match loaded {
        Loaded::Degraded(Degraded { title, detail }) => format!("! {}: {}\n", title, detail),
        Loaded::Ready(_) => String::new(),
    }
}

/// Terminal rendering of the feed selector.
pub fn render_selector_text(selector: &Loaded<FeedSelector>) -> String {
    let Loaded::Ready(selector) = selector else {
        return render_degraded_text(selector);
    };
    if selector.options.len() <= 1 {
        return "no feeds\n".to_string();
    }
    let mut out = String::new();
    for (idx, option) in selector.options.iter().enumerate().skip(1) {
        let marker = if idx == selector.selected_index { '*' } else { ' ' };
        out.push_str(&format!("{} {}\n", marker, option.label));
    }
    out
}

/// One-line text form of the page list, e.g. `« 1 [2] 3 »`.
pub fn render_nav_text(nav: &NavModel) -> String {
    nav.links()
        .map(|link| match link.kind {
            NavKind::Page if link.current => format!("[{}]", link.glyph),
            _ => link.glyph.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Terminal rendering of a gallery page.
pub fn render_gallery_text(gallery: &Loaded<GalleryPage>) -> String {
    let Loaded::Ready(page) = gallery else {
        return render_degraded_text(gallery);
    };

    let mut out = String::from("Saved images");
    if let Some(count) = page.total_label() {
        out.push(' ');
        out.push_str(&count);
    }
    out.push('\n');

    if !page.navigation.is_empty() {
        out.push_str(&render_nav_text(&page.navigation));
        out.push('\n');
    }
    for entry in &page.visible {
        out.push_str(&format!("  {}\n", entry.source_path));
    }
    out
}
