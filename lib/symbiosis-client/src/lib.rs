//! HTTP client for the Symbiosis management API
//!
//! The client is constructed explicitly from a [`ClientConfig`] and passed to whoever needs it.
//! [`SymbiosisClient::connect`] validates the API key and connectivity before returning.
pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::{Deleted, SymbiosisApi};
pub use client::SymbiosisClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
