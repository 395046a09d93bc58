//! DynamoDB API client implementation.

use async_trait::async_trait;
use flightops_core::{
    Error, Item, QueryRequest, Result, ScanOutput, ScanRequest, Store, StoreConfig,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{
    from_attribute_map, to_attribute_map, ExpressionBuilder, GetItemInput, GetItemOutput,
    PageOutput, PutItemInput, QueryInput, ScanInput,
};
use crate::{CONTENT_TYPE, TARGET_PREFIX};

/// DynamoDB API client.
pub struct DynamoDbClient {
    endpoint: String,
    region: String,
    authorization: Option<String>,
    client: reqwest::Client,
}

impl DynamoDbClient {
    /// Create a client for the regional endpoint.
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let endpoint = format!("https://dynamodb.{}.amazonaws.com", region);
        Self::with_endpoint(endpoint, region)
    }

    /// Create a client with a custom endpoint (DynamoDB Local, proxies, tests).
    pub fn with_endpoint(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            region: region.into(),
            authorization: None,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> Self {
        let client = Self::with_endpoint(config.endpoint_url(), config.region.clone());
        let client = match &config.authorization {
            Some(auth) => client.with_authorization(auth.clone()),
            None => client,
        };
        if client.is_unsigned_aws() {
            warn!(
                endpoint = client.endpoint.as_str(),
                "Requests to AWS are not signed and will be rejected; \
                 set store.endpoint to a local or proxy endpoint, or store.authorization"
            );
        }
        client
    }

    /// AWS endpoint with no `Authorization` header configured.
    pub fn is_unsigned_aws(&self) -> bool {
        self.authorization.is_none()
            && reqwest::Url::parse(&self.endpoint)
                .ok()
                .and_then(|url| url.host_str().map(|host| host.ends_with(".amazonaws.com")))
                .unwrap_or(false)
    }

    /// Send a static `Authorization` header with every request.
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke a DynamoDB operation.
    async fn call<B: Serialize, T: DeserializeOwned>(&self, operation: &str, body: &B) -> Result<T> {
        debug!(operation = operation, endpoint = self.endpoint.as_str(), "DynamoDB request");

        let payload = serde_json::to_vec(body)?;
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .body(payload);
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                operation = operation,
                body = text.as_str(),
                "DynamoDB error response"
            );
            return Err(Error::from_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidData(format!("Failed to parse {} response: {}", operation, e)))
    }
}

#[async_trait]
impl Store for DynamoDbClient {
    fn name(&self) -> &str {
        "dynamodb"
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanOutput> {
        let mut builder = ExpressionBuilder::new();
        let filter_expression = request.filter.as_ref().map(|f| builder.filter(f));

        let mut input = ScanInput {
            table_name: request.table.clone(),
            filter_expression,
            expression_attribute_names: builder.names(),
            expression_attribute_values: builder.values(),
            limit: request.limit,
            exclusive_start_key: None,
        };

        let mut output = ScanOutput::default();
        loop {
            let page: PageOutput = self.call("Scan", &input).await?;
            output.scanned_count += page.scanned_count;
            for item in page.items {
                output.items.push(from_attribute_map(item)?);
            }

            // A limited scan reads a single page.
            match page.last_evaluated_key {
                Some(key) if request.limit.is_none() => input.exclusive_start_key = Some(key),
                _ => break,
            }
        }
        output.count = output.items.len();

        debug!(
            table = request.table.as_str(),
            count = output.count,
            scanned = output.scanned_count,
            "Scan complete"
        );
        Ok(output)
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<Item>> {
        if request.key.is_empty() {
            return Err(Error::InvalidData(
                "Query requires at least one key condition".to_string(),
            ));
        }

        let mut builder = ExpressionBuilder::new();
        let key_condition_expression = builder.key_condition(&request.key);
        let filter_expression = request.filter.as_ref().map(|f| builder.filter(f));

        let mut input = QueryInput {
            table_name: request.table.clone(),
            index_name: request.index.clone(),
            key_condition_expression,
            filter_expression,
            expression_attribute_names: builder.names(),
            expression_attribute_values: builder.values(),
            exclusive_start_key: None,
        };

        let mut items = Vec::new();
        loop {
            let page: PageOutput = self.call("Query", &input).await?;
            for item in page.items {
                items.push(from_attribute_map(item)?);
            }
            match page.last_evaluated_key {
                Some(key) => input.exclusive_start_key = Some(key),
                None => break,
            }
        }

        debug!(
            table = request.table.as_str(),
            index = ?request.index,
            count = items.len(),
            "Query complete"
        );
        Ok(items)
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        let input = GetItemInput {
            table_name: table.to_string(),
            key: to_attribute_map(&key),
        };
        let output: GetItemOutput = self.call("GetItem", &input).await?;
        output.item.map(from_attribute_map).transpose()
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let input = PutItemInput {
            table_name: table.to_string(),
            item: to_attribute_map(&item),
        };
        let _: serde_json::Value = self.call("PutItem", &input).await?;
        Ok(())
    }
}
