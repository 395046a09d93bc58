//! Common test utilities.
//!
//! - `fixture_path`: JSON fixtures in tests/fixtures/
//! - `fixture_store`: a `MemoryStore` seeded from a fixture
//! - `Session`: drives an `McpServer` over an in-memory transport

#![allow(dead_code)]

use std::io::{self, Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use flightops_core::{Store, TableNames};
use flightops_mcp::{McpServer, StdioTransport, ToolHandler};
use flightops_storage::MemoryStore;
use serde_json::{json, Value};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_store(name: &str) -> Arc<MemoryStore> {
    let store = MemoryStore::for_tables(&TableNames::default());
    store
        .load_fixture_file(fixture_path(name))
        .expect("fixture should load");
    Arc::new(store)
}

pub fn as_store(store: &Arc<MemoryStore>) -> Arc<dyn Store> {
    store.clone()
}

#[derive(Clone, Default)]
struct Output(Arc<Mutex<Vec<u8>>>);

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds a newline-delimited request script and replays it through a server.
pub struct Session {
    lines: Vec<String>,
    next_id: i64,
}

impl Session {
    /// A session that opens with the usual initialize handshake.
    pub fn new() -> Self {
        let mut session = Self {
            lines: Vec::new(),
            next_id: 1,
        };
        session.request("initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}}));
        session.raw(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string());
        session
    }

    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn request(&mut self, method: &str, params: Value) -> &mut Self {
        let line = json!({"jsonrpc": "2.0", "id": self.next_id, "method": method, "params": params});
        self.next_id += 1;
        self.raw(line.to_string())
    }

    pub fn call(&mut self, tool: &str, arguments: Value) -> &mut Self {
        self.request("tools/call", json!({"name": tool, "arguments": arguments}))
    }

    /// Serve the script and return every response line, parsed.
    pub async fn run(&self, handler: Arc<dyn ToolHandler>) -> Vec<Value> {
        let input = self.lines.join("\n") + "\n";
        let output = Output::default();
        let mut transport = StdioTransport::new(
            Box::new(Cursor::new(input)),
            Box::new(output.clone()),
        );

        McpServer::new(handler)
            .serve(&mut transport)
            .await
            .expect("server loop should finish cleanly");

        let bytes = output.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("response is JSON"))
            .collect()
    }
}

/// Text of a `tools/call` response.
pub fn tool_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .expect("tool result has text content")
}

/// The JSON document embedded after a result's heading.
pub fn tool_payload(response: &Value) -> Value {
    let text = tool_text(response);
    let start = text.find('{').expect("result has a JSON payload");
    serde_json::from_str(&text[start..]).unwrap()
}
