//! Backend for a children's speech-practice app.
//!
//! Parents register accounts and add kid profiles; the app stores each
//! kid's progress through narrated stories, including scored speech
//! attempts. This crate provides the data model, the SQLite persistence
//! layer, and the HTTP API on top of it.
//!
//! # Usage
//!
//! ```no_run
//! use fluently::config::Settings;
//! use fluently::db::Database;
//!
//! let settings = Settings::from_env();
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let app = fluently::api::create_router(db, settings);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;

pub use db::Database;
