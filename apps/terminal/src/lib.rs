//! # till-terminal
//!
//! Headless checkout terminal for Till POS: one operator, one open order,
//! commands on stdin and JSON replies on stdout.
//!
//! ## Module Organization
//! ```text
//! till_terminal/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── config.rs       ◄─── till.toml + TILL_* overrides
//! ├── command.rs      ◄─── Line parser
//! ├── session.rs      ◄─── CheckoutSession (owns the Order)
//! └── error.rs        ◄─── TerminalError { code, message }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod session;

use tracing_subscriber::EnvFilter;

pub use command::Command;
pub use config::TerminalConfig;
pub use error::{ErrorCode, TerminalError, TerminalResult};
pub use session::{CheckoutSession, ProductRow, Reply};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,till=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only command replies.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_db=trace` - Trace for the storage crate only
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
