use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, RecipeShortResponse};

/// Registered user. Credentials live with the external auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// User as seen by a viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
}

/// An author the user follows, with a preview of their newest recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
}

impl User {
    pub fn new(request: CreateUserRequest) -> Self {
        Self {
            id: generate_id('U'),
            email: request.email.trim().to_lowercase(),
            username: request.username.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn to_response(&self, is_subscribed: bool) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_subscribed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation_normalizes_email() {
        let user = User::new(CreateUserRequest {
            email: " Cook@Example.COM ".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        });

        assert!(user.id.starts_with('U'));
        assert_eq!(user.email, "cook@example.com");

        let response = user.to_response(true);
        assert!(response.is_subscribed);
        assert_eq!(response.username, "cook");
    }

    #[test]
    fn test_subscription_response_flattens_author() {
        let user = User::new(CreateUserRequest {
            email: "chef@example.com".to_string(),
            username: "chef".to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
        });
        let response = SubscriptionResponse {
            author: user.to_response(true),
            recipes: vec![],
            recipes_count: 3,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["username"], "chef");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 3);
    }
}
