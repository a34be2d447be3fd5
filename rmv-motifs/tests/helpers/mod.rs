//! Test Helper Utilities
//!
//! Shared fixtures for rmv-motifs integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod static_source;

pub use fixtures::{collection, grouped, instance, write_file};
pub use static_source::StaticSource;
