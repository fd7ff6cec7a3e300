//! # ragline
//!
//! Retrieval-augmented question answering over local text documents.
//!
//! Documents are split into overlapping chunks, embedded, and stored in a
//! vector index. A question retrieves the most similar chunks, a local
//! Ollama model answers from them, and a keyword check labels how
//! confident the answer sounds.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Documents  │──▶│ Split+Embed  │──▶│ Vector index │
//! │ .md / .txt │   │              │   │ (index.json) │
//! └────────────┘   └──────────────┘   └──────┬───────┘
//!                                            │ top-k
//!                  ┌──────────┐   ┌──────────▼───────┐   ┌───────────┐
//!   question ─────▶│ Pipeline │──▶│ Ollama generate  │──▶│ Validator │
//!                  └──────────┘   └──────────────────┘   └─────┬─────┘
//!                                                              ▼
//!                                              answer + confidence + sources
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragline index --demo           # embed the built-in demo documents
//! ragline chat                   # ask questions interactively
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`document`] | Loading and splitting text files |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Vector index and persistence |
//! | [`generation`] | Language model client |
//! | [`prompt`] | Per-language prompt and answer texts |
//! | [`validate`] | Confidence check |
//! | [`pipeline`] | Retrieve → generate → validate |
//! | [`monitor`] | Query log and statistics |
//! | [`chat`] | Interactive loop |
//! | [`commands`] | CLI command implementations |
//! | [`progress`] | Index-build progress reporting |

pub mod chat;
pub mod commands;
pub mod config;
pub mod document;
pub mod embedding;
pub mod generation;
mod http;
pub mod index;
pub mod models;
pub mod monitor;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod validate;
