//! Common utilities and shared types for clubdesk.
//!
//! This crate provides foundational components used across all clubdesk crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Attachment storage on the local filesystem with the upload
//!   allow-list enforced by [`FileRules`]
//!
//! # Example
//!
//! ```no_run
//! use clubdesk_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{FileRules, LocalStorage, StorageBackend, StoredFile, generate_storage_key};
