//! CLI command implementations.

pub mod archive;
pub mod config;
pub mod mind;
