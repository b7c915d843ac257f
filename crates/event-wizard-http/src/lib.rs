//! HTTP implementation of the event wizard's remote API
//!
//! [`HttpEventApi`] talks to the event backend: a presign endpoint handing out
//! signed upload URLs, the storage service behind those URLs, and the endpoint
//! creating event records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;

pub use client::{HttpApiError, HttpEventApi, DEFAULT_CREATE_PATH, DEFAULT_PRESIGN_PATH};
