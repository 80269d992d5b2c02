//! Shared CLI infrastructure.
//!
//! The binary's command modules live in `main.rs`; only the logging
//! bootstrap is exposed as a library so integration tests can reuse it.

pub mod logging;
