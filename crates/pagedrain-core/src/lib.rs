//! Pagedrain Core - shared foundation for the pagedrain crates.
//!
//! This crate provides configuration management, error handling and the
//! result types reported by scroll sessions. It has no browser dependency.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`CssSelector`, `ExhaustOutcome`)
//!
//! # Example
//!
//! ```rust
//! use pagedrain_core::{AppConfig, ScrollConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = AppConfig::default();
//! config.scroll = ScrollConfig::default()
//!     .with_max_pages(5)
//!     .with_control_selector("#loadMore");
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BackoffMode, BrowserConfig, ScrollConfig, MAX_DEADLINE_SECS, MAX_DELAY_MS,
};
pub use error::{ConfigError, ConfigResult, PagedrainError, Result};
pub use types::{CssSelector, ExhaustOutcome, TerminationReason};
