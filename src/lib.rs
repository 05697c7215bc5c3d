//! mtb-tools - migration and maintenance toolkit for the mtb phase archive
//!
//! This crate provides:
//! - Runtime schema discovery and row extraction for legacy SQLite files
//! - Content cleanup and placeholder page synthesis during import
//! - JSON / preview sinks and a target store for pages, media and history
//! - Cache maintenance with capability-checked pattern clearing

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod legacy;
pub mod normalize;
pub mod phase;
pub mod progress;
pub mod resolve;
pub mod sink;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{Error, Result};
