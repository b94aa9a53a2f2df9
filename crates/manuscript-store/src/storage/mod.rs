//! Storage module for persistent data storage
//!
//! Provides the SQLite-backed document database for records.

mod database;

pub use database::RecordDb;
