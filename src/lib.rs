//! Studiochat is the streaming chat client core for the studio assistant
//! backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the streaming pipeline: newline framing, event
//!   classification, the tool-activity state machine, leaked-record
//!   filtering, and the bounded-retry send cycle.
//! - [`render`] defines the synchronous sink the pipeline drives with
//!   presentation instructions; the surrounding UI implements it.
//! - [`api`] defines the wire payloads exchanged with the backend.
//! - [`cli`] provides the one-shot terminal front end.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`), which
//! parses arguments and dispatches into [`cli`].

pub mod api;
pub mod cli;
pub mod core;
pub mod render;
pub mod utils;
