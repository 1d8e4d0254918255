//! # repulse-core
//!
//! Core library for repulse - a repository traffic collector.
//!
//! This library provides:
//! - The traffic resource model (clones, views, release downloads, stars)
//! - A fetcher for the GitHub REST API, including release pagination
//! - SQLite storage with per-day upserts into a single wide table
//! - Configuration, credentials and logging infrastructure
//!
//! ## Architecture
//!
//! Each run walks a fixed list of resource kinds:
//! - **Fetch:** build the URL for the kind and decode the API response
//! - **Normalize:** collapse the response into [`DailyRecord`]s
//! - **Persist:** upsert the records into the `traffic` table by day
//!
//! ## Example
//!
//! ```rust,no_run
//! use repulse_core::{Collector, Config, Credentials, Database, ReqwestTransport, ResourceKind};
//!
//! let config = Config::load().expect("failed to load config");
//! let credentials = Credentials::from_env().expect("missing credentials");
//! let transport = ReqwestTransport::new(&config.github).expect("failed to build client");
//!
//! let db = Database::open(&config.storage.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let collector = Collector::new(credentials, transport, &config.github);
//! collector
//!     .collect(&db, &ResourceKind::ALL, |_| {})
//!     .expect("collection failed");
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, Credentials};
pub use db::{Database, TrafficRow};
pub use error::{Error, Result};
pub use pipeline::{Collector, Progress, RunSummary};
pub use traffic::{DailyRecord, Fetcher, ReqwestTransport, Resource, ResourceKind, Transport};

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod traffic;
