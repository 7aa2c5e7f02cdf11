use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: String },

    #[error("Ingredient not found: {id}")]
    IngredientNotFound { id: String },

    #[error("Tag not found: {id}")]
    TagNotFound { id: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("{target_id} is already in {list} of user {user_id}")]
    AlreadyInList {
        user_id: String,
        list: String,
        target_id: String,
    },

    #[error("{target_id} is not in {list} of user {user_id}")]
    NotInList {
        user_id: String,
        list: String,
        target_id: String,
    },

    #[error("User {user_id} cannot subscribe to themselves")]
    SelfSubscription { user_id: String },

    #[error("User {user_id} is not allowed to {action}")]
    Forbidden { user_id: String, action: String },

    #[error("Already exists: {field}={value}")]
    AlreadyExists { field: String, value: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },

    #[error("Duplicate value in {field}: {value}")]
    Duplicate { field: String, value: String },
}

/// Aggregation failure while building a shopping list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("Recipe not found: {recipe_id}")]
    RecipeNotFound { recipe_id: String },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

impl From<AggregationError> for ServiceError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::RecipeNotFound { recipe_id } => {
                ServiceError::RecipeNotFound { id: recipe_id }
            }
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServiceError::RecipeNotFound {
            id: "R0001".to_string(),
        };
        assert_eq!(error.to_string(), "Recipe not found: R0001");

        let validation_error = ValidationError::RequiredField {
            field: "ingredients".to_string(),
        };
        assert_eq!(
            validation_error.to_string(),
            "Required field missing: ingredients"
        );

        let error = ServiceError::AlreadyInList {
            user_id: "U1".to_string(),
            list: "shopping_cart".to_string(),
            target_id: "R1".to_string(),
        };
        assert_eq!(error.to_string(), "R1 is already in shopping_cart of user U1");
    }

    #[test]
    fn test_error_conversion() {
        let validation_error = ValidationError::OutOfRange {
            field: "cooking_time".to_string(),
            min: "1".to_string(),
            max: "32000".to_string(),
            value: "0".to_string(),
        };

        let service_error: ServiceError = validation_error.into();
        match service_error {
            ServiceError::ValidationError { message } => {
                assert!(message.contains("cooking_time"));
            }
            _ => panic!("Expected ValidationError conversion"),
        }
    }

    #[test]
    fn test_aggregation_error_keeps_recipe_id() {
        let err: ServiceError = AggregationError::RecipeNotFound {
            recipe_id: "R42".to_string(),
        }
        .into();
        match err {
            ServiceError::RecipeNotFound { id } => assert_eq!(id, "R42"),
            other => panic!("Expected RecipeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_repository_error_from_serde() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json");
        assert!(json_error.is_err());

        let repo_error: RepositoryError = json_error.unwrap_err().into();
        match repo_error {
            RepositoryError::Serialization { .. } => {}
            _ => panic!("Expected Serialization error"),
        }
    }
}
