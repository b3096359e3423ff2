//! A per-user "second brain": Markdown notes on disk, mirrored to a table
//! store, chunked and embedded into SQLite, and queryable over HTTP.
//!
//! Each user owns a vault directory. Every saved note is written to the vault,
//! upserted into the configured mirror, and re-chunked into the retrieval
//! index. Questions are answered by embedding them, pulling the nearest chunks
//! with [sqlite-vec](https://github.com/asg017/sqlite-vec), and optionally
//! passing those chunks to a hosted chat model.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with a `vec0` table for chunk vectors
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   or a feature-hashing embedder for offline use
//! - **Mirror**: the index database itself, or a PostgREST endpoint
//! - **Transport**: JSON over HTTP (axum)
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`vault`]: per-user note files and front-matter
//! - [`mirror`]: table mirroring of saved notes
//! - [`db`]: SQLite setup, schema, migrations, and health checks
//! - [`embedding`]: text-to-vector providers
//! - [`retrieval`]: chunking, indexing and similarity search
//! - [`llm`], [`assistant`]: question answering over retrieved chunks
//! - [`profile`]: starter notes from onboarding answers
//! - [`service`], [`api`], [`server`]: orchestration and the HTTP surface

pub mod api;
pub mod assistant;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod mirror;
pub mod profile;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod vault;

pub use error::{CocoonError, Result};
