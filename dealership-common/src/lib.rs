//! # Dealership Common Library
//!
//! Shared code for the dealership services including:
//! - Error and result types
//! - Bootstrap configuration loading
//! - SQLite schema initialization
//! - Catalog (car make / model) store
//! - Identity (user principal) store

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
