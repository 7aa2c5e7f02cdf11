use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::dynamodb::map_dynamodb_error;
use crate::config::DatabaseConfig;
use crate::models::{RepositoryError, RepositoryResult};

/// Key layout of one table or index: hash key plus optional range key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    pub hash_key: &'static str,
    pub range_key: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub keys: KeyLayout,
}

/// Everything needed to create a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table_name: String,
    pub keys: KeyLayout,
    pub indexes: Vec<IndexSpec>,
}

impl TableSpec {
    fn simple(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            keys: KeyLayout {
                hash_key: "id",
                range_key: None,
            },
            indexes: Vec::new(),
        }
    }

    /// Distinct string attributes used by the table key and its indexes
    pub fn key_attributes(&self) -> Vec<&'static str> {
        let mut attributes = Vec::new();
        let layouts = std::iter::once(&self.keys).chain(self.indexes.iter().map(|i| &i.keys));
        for layout in layouts {
            for attribute in std::iter::once(layout.hash_key).chain(layout.range_key) {
                if !attributes.contains(&attribute) {
                    attributes.push(attribute);
                }
            }
        }
        attributes
    }
}

/// Table layouts for every table the service uses
pub fn foodgram_tables(database: &DatabaseConfig) -> Vec<TableSpec> {
    vec![
        TableSpec {
            indexes: vec![IndexSpec {
                name: "AuthorIndex",
                keys: KeyLayout {
                    hash_key: "author_id",
                    range_key: Some("created_at"),
                },
            }],
            ..TableSpec::simple(&database.recipes_table_name)
        },
        TableSpec::simple(&database.ingredients_table_name),
        TableSpec::simple(&database.tags_table_name),
        TableSpec::simple(&database.users_table_name),
        TableSpec {
            table_name: database.user_lists_table_name.clone(),
            keys: KeyLayout {
                hash_key: "user_id",
                range_key: Some("list_key"),
            },
            indexes: Vec::new(),
        },
    ]
}

fn build_error(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::AwsSdk {
        message: format!("Failed to build {}: {}", what, e),
    }
}

fn key_schema(layout: &KeyLayout) -> RepositoryResult<Vec<KeySchemaElement>> {
    let mut schema = vec![KeySchemaElement::builder()
        .attribute_name(layout.hash_key)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| build_error("key schema", e))?];

    if let Some(range_key) = layout.range_key {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(range_key)
                .key_type(KeyType::Range)
                .build()
                .map_err(|e| build_error("key schema", e))?,
        );
    }

    Ok(schema)
}

/// Manages DynamoDB table creation and configuration
pub struct TableManager {
    client: Arc<DynamoDbClient>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self {
            client,
            poll_interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }

    /// Create one table and wait until it is active; existing tables are left alone
    #[instrument(skip(self, spec), fields(table_name = %spec.table_name))]
    pub async fn create_table(&self, spec: &TableSpec) -> RepositoryResult<()> {
        if self.table_exists(&spec.table_name).await? {
            info!("Table {} already exists", spec.table_name);
            return Ok(());
        }

        let attribute_definitions = spec
            .key_attributes()
            .into_iter()
            .map(|name| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .map_err(|e| build_error("attribute definition", e))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let indexes = spec
            .indexes
            .iter()
            .map(|index| {
                GlobalSecondaryIndex::builder()
                    .index_name(index.name)
                    .set_key_schema(Some(key_schema(&index.keys)?))
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()
                    .map_err(|e| build_error("GSI", e))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        self.client
            .create_table()
            .table_name(&spec.table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema(&spec.keys)?))
            .set_global_secondary_indexes(if indexes.is_empty() {
                None
            } else {
                Some(indexes)
            })
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| map_dynamodb_error(&spec.table_name, e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(&spec.table_name).await?;
        info!("Table {} created successfully", spec.table_name);

        Ok(())
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service_error| service_error.is_resource_not_found_exception())
                    .unwrap_or(false);

                if not_found {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;

        loop {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

            match response.table.and_then(|table| table.table_status) {
                Some(TableStatus::Active) => {
                    info!("Table {} is now active", table_name);
                    return Ok(());
                }
                Some(status) => info!("Table {} status: {:?}, waiting...", table_name, status),
                None => warn!("Table {} status unknown, waiting...", table_name),
            }

            attempts += 1;
            if attempts >= self.max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Timeout);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Create every service table concurrently
    #[instrument(skip(self, database))]
    pub async fn create_all_tables(&self, database: &DatabaseConfig) -> RepositoryResult<Vec<String>> {
        info!("Creating all tables");

        let specs = foodgram_tables(database);
        let results =
            futures::future::join_all(specs.iter().map(|spec| self.create_table(spec))).await;

        for result in results {
            result?;
        }

        info!("All tables created successfully");
        Ok(specs.into_iter().map(|spec| spec.table_name).collect())
    }
}
