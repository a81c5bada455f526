//! Database module: schema, models, startup bootstrap, and the DB actor.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `models.rs`: Rust structs mirroring DB rows
//! - `bootstrap.rs`: idempotent schema-ensure-and-seed at startup
//! - `actor.rs`: the actor owning the pool, serving quote lookups

pub mod actor;
pub mod bootstrap;
pub mod models;
pub mod schema;

pub use actor::{DbHandle, QuoteSample, TableStats, spawn};
pub use models::QuoteRow;
pub use schema::SQLITE_INIT;
