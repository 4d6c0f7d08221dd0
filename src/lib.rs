//! # lakedrop
//!
//! Incremental, content-addressed document ingestion for a file-drop
//! data lake.
//!
//! lakedrop watches a source directory for new or changed files,
//! computes a stable content identity for each, stores the raw bytes
//! exactly once per unique content, and records catalog metadata plus a
//! full observation and lineage history.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Connector  │──▶│   Change     │──▶│ Orchestrator │
//! │  file_drop  │   │   Detector   │   │  (per run)   │
//! └─────────────┘   └──────┬───────┘   └──────┬───────┘
//!                          │ reads            │ writes
//!                          ▼                  ▼
//!                   ┌──────────────┐   ┌──────────────┐
//!                   │   Catalog    │   │  Blob store  │
//!                   │   (SQLite)   │   │   fs / S3    │
//!                   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lakedrop init                 # create the catalog
//! lakedrop scan inbox           # show what needs ingestion
//! lakedrop run inbox            # evaluate + ingest once
//! lakedrop watch inbox          # poll continuously
//! lakedrop stats                # catalog counts
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`identity`] | Content hashing (sha256) |
//! | [`connector`] | Source connector contract |
//! | [`connector_fs`] | File-drop connector |
//! | [`detect`] | Change detection strategies |
//! | [`ingest`] | Ingestion orchestration |
//! | [`catalog`] | Catalog store trait + backends |
//! | [`blob`] | Blob store trait + backends |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod blob;
pub mod catalog;
pub mod config;
pub mod connector;
pub mod connector_fs;
pub mod db;
pub mod detect;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod runner;
pub mod sources;
pub mod stats;
