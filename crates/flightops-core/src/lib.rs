//! Core traits, types, and error handling for flightops.
//!
//! This crate provides the foundational abstractions shared by the store
//! backends and the two MCP servers: the `Store` trait, the typed records
//! read from and written to it, and the configuration file format.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{Config, StoreConfig, TableNames};
pub use error::{Error, Result};
pub use store::{Filter, Item, QueryRequest, ScanOutput, ScanRequest, Store};
pub use types::*;
