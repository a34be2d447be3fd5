//! # RMV Common Library
//!
//! Shared code for the RNA motif visualizer workspace:
//! - Common error and result types
//! - TOML configuration schema, loading and atomic write-back
//! - Root folder resolution (CLI → environment → TOML → platform default)

pub mod config;
pub mod error;

pub use error::{Error, Result};
