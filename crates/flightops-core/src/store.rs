//! Document store abstraction.
//!
//! Tables hold JSON documents keyed by a partition key and an optional sort
//! key. Secondary indexes are declared by the provisioning side; callers name
//! them in [`QueryRequest::index`] and the backend resolves them.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// A stored document: attribute name to value.
pub type Item = Map<String, Value>;

/// Filter applied to scanned or queried items.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute equals value
    Eq(String, Value),
    /// Attribute is numerically greater than value
    Gt(String, Value),
    /// Attribute equals one of the values
    In(String, Vec<Value>),
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(attr.into(), value.into())
    }

    pub fn gt(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(attr.into(), value.into())
    }

    pub fn one_of<V: Into<Value>>(attr: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(attr.into(), values.into_iter().map(Into::into).collect())
    }

    /// Evaluate the filter against an item in memory.
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::Eq(attr, value) => item.get(attr) == Some(value),
            Filter::Gt(attr, value) => match (item.get(attr).and_then(Value::as_f64), value.as_f64())
            {
                (Some(actual), Some(bound)) => actual > bound,
                _ => false,
            },
            Filter::In(attr, values) => item.get(attr).is_some_and(|v| values.contains(v)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(item)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(item)),
        }
    }
}

/// Parameters for a table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub table: String,
    pub filter: Option<Filter>,
    /// Maximum number of items to evaluate. `None` scans the whole table.
    pub limit: Option<u32>,
}

impl ScanRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub items: Vec<Item>,
    /// Items returned after filtering
    pub count: usize,
    /// Items evaluated before filtering
    pub scanned_count: usize,
}

/// Parameters for a key-condition query against a table or index.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    /// Equality conditions on the partition key and, optionally, the sort key.
    pub key: Vec<(String, Value)>,
    pub filter: Option<Filter>,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn on_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn key_eq(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.push((attr.into(), value.into()));
        self
    }

    /// Whether an item satisfies every key condition.
    pub fn matches_key(&self, item: &Item) -> bool {
        self.key
            .iter()
            .all(|(attr, value)| item.get(attr) == Some(value))
    }
}

/// Document store used by the tool handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for diagnostics (e.g. "dynamodb", "memory").
    fn name(&self) -> &str;

    /// Region or location the backend talks to.
    fn region(&self) -> &str;

    /// Scan a table, optionally filtered.
    async fn scan(&self, request: ScanRequest) -> Result<ScanOutput>;

    /// Query a table or secondary index by key equality.
    async fn query(&self, request: QueryRequest) -> Result<Vec<Item>>;

    /// Fetch a single item by its full primary key.
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>>;

    /// Write an item, replacing any item with the same key.
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;
}
