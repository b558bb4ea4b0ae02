//! Common types shared by the user store crates.
//!
//! This crate provides:
//! - The store error taxonomy
//! - Cluster connection configuration

pub mod config;
pub mod error;

pub use config::*;
pub use error::{DbError, DbResult};
