//! Starplot CLI library.
//!
//! Logging setup, terminal styling and progress-record formatting used by
//! the `starplot-cli` binary.

pub mod logging;
pub mod output;
pub mod terminal;
