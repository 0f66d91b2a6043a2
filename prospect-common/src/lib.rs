//! # Prospect Common Library
//!
//! Shared code for the Prospect services including:
//! - Common error types
//! - TOML/environment configuration loading

pub mod config;
pub mod error;

pub use error::{Error, Result};
