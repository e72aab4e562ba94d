//! # clubhouse-dashboard
//!
//! Web UI for the Clubhouse membership manager.
//!
//! This crate serves server-rendered pages for:
//! - First-run setup (naming the club)
//! - The member list with category tabs, filters and counts
//! - Adding, editing and deleting members
//! - Custom field management
//! - Spreadsheet export (all or filtered) and the upload, map, import flow
//! - Settings (club name, connection overview)
//!
//! ## Tech Stack
//!
//! - Axum for HTTP, with `tower-http` request tracing
//! - HTML built with `format!` in [`templates`]
//! - Tailwind CSS and Alpine.js from a CDN

pub mod error;
pub mod forms;
pub mod handlers;
pub mod pages;
pub mod pages_extra;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

pub use error::DashboardError;
pub use routes::create_router;
pub use server::{DashboardServer, shutdown_signal};
pub use state::AppState;
