//! Database layer for repulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Per-day upserts into the wide `traffic` table
//! - Read queries for stored days

pub mod repo;
pub mod schema;

pub use repo::{columns, Columns, Database, TrafficRow};
