//! # cimport Common Library
//!
//! Shared code for the contact import tooling:
//! - Error types
//! - TOML configuration file model and discovery

pub mod config;
pub mod error;

pub use error::{Error, Result};
