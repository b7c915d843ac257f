//! Fakes for the wizard's external collaborators.

pub mod event_api;
pub mod shell;
