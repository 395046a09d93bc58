//! In-memory document store.
//!
//! `MemoryStore` implements the same `Store` trait as the network backends
//! and is used for local runs against fixture data and in tests:
//!
//! ```ignore
//! use flightops_core::TableNames;
//! use flightops_storage::MemoryStore;
//!
//! let store = MemoryStore::for_tables(&TableNames::default());
//! store.load_fixture_file("fixtures/frankfurt.json")?;
//! ```
//!
//! Fixture files map table names to arrays of items:
//! `{ "Flights": [ { "FlightNumber": "LH400", ... } ] }`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use flightops_core::{
    Error, Item, QueryRequest, Result, ScanOutput, ScanRequest, Store, TableNames,
};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Table {
    key: Vec<String>,
    items: Vec<Item>,
}

impl Table {
    fn position(&self, item: &Item) -> Option<usize> {
        if self.key.is_empty() {
            return None;
        }
        self.items.iter().position(|existing| {
            self.key
                .iter()
                .all(|attr| existing.get(attr).is_some() && existing.get(attr) == item.get(attr))
        })
    }
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    /// Create an empty store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with every known table declared, using their primary keys.
    pub fn for_tables(names: &TableNames) -> Self {
        let store = Self::new();
        store.create_table(&names.flights, &["FlightNumber", "DepartureDate"]);
        store.create_table(&names.passengers, &["PassengerId", "BookingReference"]);
        store.create_table(&names.bookings, &["BookingReference", "PassengerId"]);
        store.create_table(&names.delay_notifications, &["NotificationId"]);
        store.create_table(&names.rebooking_options, &["OptionId"]);
        store.create_table(&names.support_sessions, &["SessionId"]);
        store.create_table(&names.passenger_preferences, &["PassengerId"]);
        store
    }

    /// Declare a table and its primary key attributes.
    pub fn create_table(&self, name: &str, key: &[&str]) {
        if let Ok(mut tables) = self.tables.write() {
            tables.entry(name.to_string()).or_default().key =
                key.iter().map(|k| k.to_string()).collect();
        }
    }

    /// Insert items into a table, creating it if needed.
    pub fn insert_items(&self, table: &str, items: impl IntoIterator<Item = Item>) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        let table = tables.entry(table.to_string()).or_default();
        for item in items {
            match table.position(&item) {
                Some(index) => table.items[index] = item,
                None => table.items.push(item),
            }
        }
        Ok(())
    }

    /// Load items from a JSON fixture document.
    pub fn load_fixture(&self, fixture: Value) -> Result<usize> {
        let Value::Object(tables) = fixture else {
            return Err(Error::InvalidData(
                "Fixture must be an object of table name to item array".to_string(),
            ));
        };

        let mut loaded = 0;
        for (table, items) in tables {
            let Value::Array(items) = items else {
                return Err(Error::InvalidData(format!(
                    "Fixture table '{}' must be an array",
                    table
                )));
            };
            let items = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(Error::InvalidData(format!(
                        "Fixture item in '{}' is not an object: {}",
                        table, other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            loaded += items.len();
            debug!(table = table.as_str(), count = items.len(), "Loading fixture table");
            self.insert_items(&table, items)?;
        }
        Ok(loaded)
    }

    /// Load items from a JSON fixture file.
    pub fn load_fixture_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Storage(format!("Failed to read fixture {}: {}", path.display(), e))
        })?;
        let fixture: Value = serde_json::from_str(&contents)?;
        let loaded = self.load_fixture(fixture)?;
        info!(path = ?path, items = loaded, "Fixture loaded");
        Ok(loaded)
    }

    /// All items of a table, in insertion order.
    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(table).map(|t| t.items.clone()))
            .unwrap_or_default()
    }

    fn with_table<T>(&self, name: &str, f: impl FnOnce(&Table) -> T) -> Result<T> {
        let tables = self
            .tables
            .read()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        let table = tables
            .get(name)
            .ok_or_else(|| Error::Storage(format!("Table not found: {}", name)))?;
        Ok(f(table))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn region(&self) -> &str {
        "local"
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanOutput> {
        self.with_table(&request.table, |table| {
            let limit = request.limit.map_or(usize::MAX, |l| l as usize);
            let scanned: Vec<&Item> = table.items.iter().take(limit).collect();
            let items: Vec<Item> = scanned
                .iter()
                .filter(|item| request.filter.as_ref().map_or(true, |f| f.matches(item)))
                .map(|item| (*item).clone())
                .collect();

            ScanOutput {
                count: items.len(),
                scanned_count: scanned.len(),
                items,
            }
        })
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<Item>> {
        self.with_table(&request.table, |table| {
            table
                .items
                .iter()
                .filter(|item| request.matches_key(item))
                .filter(|item| request.filter.as_ref().map_or(true, |f| f.matches(item)))
                .cloned()
                .collect()
        })
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        self.with_table(table, |t| {
            t.items
                .iter()
                .find(|item| key.iter().all(|(attr, value)| item.get(attr) == Some(value)))
                .cloned()
        })
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.with_table(table, |_| ())?;
        self.insert_items(table, [item])
    }
}
