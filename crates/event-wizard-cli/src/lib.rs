//! Terminal front end for the event creation wizard
//!
//! Configuration loading, logging setup and a line-oriented
//! [`PresentationShell`](event_wizard_core::PresentationShell) for the
//! `event-wizard` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration loaded from the environment
pub mod config;

/// Logging setup
pub mod logging;

/// Line-oriented terminal shell
pub mod shell;

pub use config::{ConfigError, LogFormat, WizardConfig};
pub use logging::init_logging;
pub use shell::{media_type_for, TerminalShell};
