//! DynamoDB store implementation for flightops.
//!
//! Speaks the DynamoDB JSON 1.0 protocol (`Scan`, `Query`, `GetItem`,
//! `PutItem`) directly over HTTP. Requests are not SigV4-signed; point the
//! client at DynamoDB Local or a signing proxy, optionally with a static
//! `Authorization` header.

mod client;
mod types;

pub use client::DynamoDbClient;
pub use types::*;

/// Protocol target prefix sent in `X-Amz-Target`.
pub const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// Content type of request and response bodies.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
