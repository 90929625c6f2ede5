// Export tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # New API Exporter
//!
//! `newapi-export` is a CLI tool and library that reads a New API database
//! and writes the EZ-API intermediate JSON format consumed by the EZ-API
//! importer.
//!
//! ## Entity Mapping
//!
//! | New API | EZ-API | Notes |
//! |---------|--------|-------|
//! | channel | provider | Multi-key channels split into one provider per secret |
//! | user | master | Only users owning at least one token |
//! | token | key | Plaintext token carried over |
//! | ability | binding | Opt-in with `--include-abilities` |
//!
//! Settings that have no EZ-API counterpart are reported as warnings in the
//! output instead of failing the export.
//!
//! ## Quick Start
//!
//! ```bash
//! # From a SQLite deployment
//! newapi-export export --source-type sqlite --source-path ./one-api.db -o export.json
//!
//! # From MySQL, using the same DSN as New API
//! newapi-export export --source-type mysql \
//!     --source-dsn "root:secret@tcp(localhost:3306)/new-api" -o export.json
//!
//! # Check an export file
//! newapi-export validate export.json
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   type: mysql
//!   url: root:secret@tcp(localhost:3306)/new-api
//!
//! options:
//!   include_tokens: true
//!   include_abilities: false
//!   output: export.json
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod connectors;
pub mod error;
pub mod mapping;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod schema;
pub mod transform;

pub use config::{ExportConfig, ExportOptions, SourceConfig};
pub use connectors::{create_repository, DatabaseStats, EntityKind, SourceRepository, SqlRepository};
pub use error::{Error, Phase, Result};
pub use pipeline::{Pipeline, PipelineOptions};
pub use schema::{ExportResult, Summary};
