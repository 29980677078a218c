//! feedwatch - dashboard client for a camera feed monitoring service.
//!
//! Three independent views share one page state:
//! - a live log console fed by the server push channel ([`logstream`])
//! - live and model images for the selected feed ([`feed`], [`client`])
//! - a paginated gallery of saved images scraped from a directory
//!   listing ([`listing`], [`gallery`])

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod gallery;
pub mod listing;
pub mod logstream;
pub mod templates;
pub mod view;

pub use error::{DashboardError, Result};
