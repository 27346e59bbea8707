//! # Sightline Common Library
//!
//! Shared code for the Sightline ingestion workspace:
//! - Error types
//! - Configuration loading and storage root resolution
//! - Database bootstrap and schema
//! - Stable identifier derivation

pub mod config;
pub mod db;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
