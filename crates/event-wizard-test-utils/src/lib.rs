//! Testing utilities for the event wizard.
//!
//! This crate provides a recording fake of the remote event API, a scripted
//! presentation shell, and generators for well-formed step values.

pub mod data_generators;
pub mod mocks;
pub mod util;

pub use mocks::event_api::{ApiGate, RecordingEventApi};
pub use mocks::shell::ScriptedShell;
