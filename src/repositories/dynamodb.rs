//! Shared DynamoDB plumbing for the table repositories.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;

use crate::models::{RepositoryError, RepositoryResult};

pub(crate) type Item = HashMap<String, AttributeValue>;

/// Create a DynamoDB client span with X-Ray and OpenTelemetry attributes
pub(crate) fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        // AWS X-Ray specific attributes
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "aws.request_id" = tracing::field::Empty,
        "aws.agent" = "rust-aws-sdk",

        // Resource identification for X-Ray
        "aws.remote.service" = "AWS::DynamoDB",
        "aws.remote.operation" = operation,
        "aws.remote.resource.type" = "AWS::DynamoDB::Table",
        "aws.remote.resource.identifier" = %table_name,

        "table_name" = %table_name,
        "endpoint" = format!("https://dynamodb.{}.amazonaws.com", region),

        // OpenTelemetry semantic conventions
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,
        "http.method" = "POST",
        "http.status_code" = tracing::field::Empty,
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,

        "component" = "aws-sdk-dynamodb",
    )
}

/// Convert a DynamoDB error to a RepositoryError
pub(crate) fn map_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    error!("DynamoDB error on {}: {:?}", table_name, error);

    match error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        DynamoDbError::ConditionalCheckFailedException(_) => {
            RepositoryError::ConstraintViolation {
                message: format!("Conditional check failed on {}", table_name),
            }
        }
        DynamoDbError::ProvisionedThroughputExceededException(_)
        | DynamoDbError::RequestLimitExceeded(_) => RepositoryError::Timeout,
        other => RepositoryError::AwsSdk {
            message: other.to_string(),
        },
    }
}

/// Scan a whole table, following `LastEvaluatedKey` pages
pub(crate) async fn scan_all(client: &DynamoDbClient, table_name: &str) -> RepositoryResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut start_key = None;
    loop {
        let output = client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

        items.extend(output.items.unwrap_or_default());
        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }
    Ok(items)
}

pub(crate) fn missing(field: &str) -> RepositoryError {
    RepositoryError::InvalidQuery {
        message: format!("Missing or invalid {}", field),
    }
}

pub(crate) fn get_s(item: &Item, field: &str) -> RepositoryResult<String> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| missing(field))
}

pub(crate) fn get_opt_s(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(|v| v.as_s().ok()).cloned()
}

pub(crate) fn get_n<T: FromStr>(item: &Item, field: &str) -> RepositoryResult<T> {
    item.get(field)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| missing(field))
}

pub(crate) fn get_datetime(item: &Item, field: &str) -> RepositoryResult<DateTime<Utc>> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| missing(field))
}

pub(crate) fn get_string_list(item: &Item, field: &str) -> Vec<String> {
    item.get(field)
        .and_then(|v| v.as_l().ok())
        .map(|list| list.iter().filter_map(|v| v.as_s().ok()).cloned().collect())
        .unwrap_or_default()
}

pub(crate) fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub(crate) fn n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}
