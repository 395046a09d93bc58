//! MCP (Model Context Protocol) servers for flightops.
//!
//! Two servers share the same protocol, transport and server loop and differ
//! only in the [`ToolHandler`] they are built with:
//!
//! - [`FlightOpsHandler`]: delay lookups, alternative flights, affected passengers
//! - [`CustomerServiceHandler`]: proactive messages, rebooking plans, escalations,
//!   notification and support-session records

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::{CustomerServiceHandler, FlightOpsHandler, ToolError, ToolHandler};
pub use server::McpServer;
pub use transport::StdioTransport;
