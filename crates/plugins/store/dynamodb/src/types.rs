//! DynamoDB wire types.
//!
//! Items travel as maps of typed attribute values (`{"S": "LH400"}`,
//! `{"N": "45"}`). They are converted to and from plain JSON documents at the
//! client boundary.

use std::collections::BTreeMap;

use flightops_core::{Error, Filter, Item, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// =============================================================================
// Attribute values
// =============================================================================

/// A typed DynamoDB attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
    SS(Vec<String>),
    NS(Vec<String>),
    B(String),
}

/// Wire representation of an item.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null(true),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::Array(items) => AttributeValue::L(items.iter().map(Into::into).collect()),
            Value::Object(map) => AttributeValue::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), AttributeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

fn parse_number(raw: &str) -> Result<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::InvalidData(format!("Invalid number attribute: {}", raw)))
}

impl TryFrom<AttributeValue> for Value {
    type Error = Error;

    fn try_from(attr: AttributeValue) -> Result<Self> {
        Ok(match attr {
            AttributeValue::S(s) | AttributeValue::B(s) => Value::String(s),
            AttributeValue::N(n) => parse_number(&n)?,
            AttributeValue::Bool(b) => Value::Bool(b),
            AttributeValue::Null(_) => Value::Null,
            AttributeValue::L(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_>>()?,
            ),
            AttributeValue::M(map) => Value::Object(from_attribute_map(map)?),
            AttributeValue::SS(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            AttributeValue::NS(items) => Value::Array(
                items
                    .iter()
                    .map(|n| parse_number(n))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

/// Convert a JSON document to its wire representation.
pub fn to_attribute_map(item: &Item) -> AttributeMap {
    item.iter()
        .map(|(k, v)| (k.clone(), AttributeValue::from(v)))
        .collect()
}

/// Convert a wire item back to a JSON document.
pub fn from_attribute_map(map: AttributeMap) -> Result<Item> {
    map.into_iter()
        .map(|(k, v)| Ok((k, Value::try_from(v)?)))
        .collect()
}

// =============================================================================
// Expressions
// =============================================================================

/// Builds condition expressions with `#n`/`:v` placeholders.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: BTreeMap<String, String>,
    values: AttributeMap,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, attr: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, a)| a.as_str() == attr) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attr.to_string());
        placeholder
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values
            .insert(placeholder.clone(), AttributeValue::from(value));
        placeholder
    }

    /// Render equality conditions joined with `AND` (key conditions).
    pub fn key_condition(&mut self, key: &[(String, Value)]) -> String {
        key.iter()
            .map(|(attr, value)| format!("{} = {}", self.name(attr), self.value(value)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Render a filter expression.
    pub fn filter(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Eq(attr, value) => format!("{} = {}", self.name(attr), self.value(value)),
            Filter::Gt(attr, value) => format!("{} > {}", self.name(attr), self.value(value)),
            Filter::In(attr, values) => {
                let name = self.name(attr);
                let placeholders: Vec<String> = values.iter().map(|v| self.value(v)).collect();
                format!("{} IN ({})", name, placeholders.join(", "))
            }
            Filter::And(filters) => self.group(filters, " AND "),
            Filter::Or(filters) => self.group(filters, " OR "),
        }
    }

    fn group(&mut self, filters: &[Filter], separator: &str) -> String {
        let parts: Vec<String> = filters
            .iter()
            .map(|f| format!("({})", self.filter(f)))
            .collect();
        parts.join(separator)
    }

    /// Placeholder names, omitted from requests when empty.
    pub fn names(&self) -> Option<BTreeMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    /// Placeholder values, omitted from requests when empty.
    pub fn values(&self) -> Option<AttributeMap> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

// =============================================================================
// Requests and responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanInput {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_attribute_names: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_attribute_values: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<AttributeMap>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryInput {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_attribute_names: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_attribute_values: Option<AttributeMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<AttributeMap>,
}

/// Response of `Scan` and `Query`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PageOutput {
    pub items: Vec<AttributeMap>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<AttributeMap>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    pub table_name: String,
    pub key: AttributeMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetItemOutput {
    pub item: Option<AttributeMap>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemInput {
    pub table_name: String,
    pub item: AttributeMap,
}
