//! Tool handlers for the MCP servers.
//!
//! Each server parses `tools/call` into its own typed tool enum, runs it
//! against the injected store and produces `Result<String, ToolError>`.
//! Conversion to the wire envelope happens once, in [`render`].

mod customer_service;
mod flight_ops;

pub use customer_service::CustomerServiceHandler;
pub use flight_ops::FlightOpsHandler;

use std::sync::Arc;

use async_trait::async_trait;
use flightops_core::{ScanRequest, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{ToolCallResult, ToolDefinition};

/// Executes the tools of one server.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name reported in `serverInfo`.
    fn server_name(&self) -> &'static str;

    /// Static tool catalog.
    fn available_tools(&self) -> Vec<ToolDefinition>;

    /// Execute a tool by name with arguments.
    async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult;
}

/// Why a tool call produced no regular result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// Nothing matched; rendered as a regular (non-error) result.
    #[error("{0}")]
    NotFound(String),

    #[error("Error {action}: {source}")]
    Store {
        action: String,
        region: String,
        #[source]
        source: flightops_core::Error,
    },

    #[error("Connection test failed: {source}")]
    Connection {
        store: String,
        region: String,
        tables: Vec<String>,
        #[source]
        source: flightops_core::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub(crate) fn invalid(tool: &str, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn store(action: &str, store: &dyn Store, source: flightops_core::Error) -> Self {
        tracing::warn!(action = action, error = %source, "Store operation failed");
        ToolError::Store {
            action: action.to_string(),
            region: store.region().to_string(),
            source,
        }
    }
}

/// What a tool produces before rendering.
pub type ToolOutcome = Result<String, ToolError>;

fn troubleshooting(region: &str) -> String {
    [
        "Troubleshooting:".to_string(),
        "1. Check that the store endpoint is reachable from this host".to_string(),
        format!("2. Confirm the tables are provisioned in region {}", region),
        "3. Verify the configured credentials allow read and write access".to_string(),
        "4. Run `flightops check` for a per-table connectivity report".to_string(),
    ]
    .join("\n")
}

/// Convert a handler outcome into the `tools/call` result envelope.
pub fn render(outcome: ToolOutcome) -> ToolCallResult {
    match outcome {
        Ok(text) => ToolCallResult::text(text),
        Err(ToolError::NotFound(message)) => ToolCallResult::text(message),
        Err(ToolError::Store {
            action,
            region,
            source,
        }) => ToolCallResult::error(format!(
            "Error {}: {}\n\n{}",
            action,
            source,
            troubleshooting(&region)
        )),
        Err(ToolError::Connection {
            store,
            region,
            tables,
            source,
        }) => ToolCallResult::error(format!(
            "Connection test failed\n\nStore: {}\nRegion: {}\nTables: {}\nError: {} - {}\n\n{}",
            store,
            region,
            tables.join(", "),
            source.kind(),
            source,
            troubleshooting(&region)
        )),
        Err(err) => ToolCallResult::error(err.to_string()),
    }
}

/// Deserialize tool arguments into their typed form. Missing arguments are
/// treated as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &str,
    arguments: Option<Value>,
) -> Result<T, ToolError> {
    let arguments = match arguments {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

/// Reject empty or whitespace-only required strings.
pub(crate) fn require(tool: &str, field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid(tool, format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn pretty<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(|e| ToolError::Internal(e.to_string()))
}

/// Identifier for a record created by this system: `<PREFIX>_<uuid>`.
pub(crate) fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Serialize)]
struct TableStatus {
    table: String,
    accessible: bool,
    sample_count: usize,
    scanned_count: usize,
}

#[derive(Debug, Serialize)]
struct ConnectionReport {
    store: String,
    region: String,
    tables: Vec<TableStatus>,
}

/// Scan one item from each table and report what came back.
pub async fn check_connection(store: &Arc<dyn Store>, tables: &[String]) -> ToolOutcome {
    let mut statuses = Vec::with_capacity(tables.len());

    for table in tables {
        let output = store
            .scan(ScanRequest::new(table.as_str()).with_limit(1))
            .await
            .map_err(|source| ToolError::Connection {
                store: store.name().to_string(),
                region: store.region().to_string(),
                tables: tables.to_vec(),
                source,
            })?;

        tracing::debug!(table = table.as_str(), scanned = output.scanned_count, "Table reachable");
        statuses.push(TableStatus {
            table: table.clone(),
            accessible: true,
            sample_count: output.count,
            scanned_count: output.scanned_count,
        });
    }

    let report = ConnectionReport {
        store: store.name().to_string(),
        region: store.region().to_string(),
        tables: statuses,
    };
    Ok(format!("Connection test successful\n\n{}", pretty(&report)?))
}
