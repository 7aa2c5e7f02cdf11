use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-user lists stored in the user lists table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserListKind {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl UserListKind {
    pub const ALL: [UserListKind; 3] = [
        UserListKind::Favorite,
        UserListKind::ShoppingCart,
        UserListKind::Subscription,
    ];

    /// Lists whose targets are recipes rather than users
    pub fn holds_recipes(&self) -> bool {
        matches!(self, UserListKind::Favorite | UserListKind::ShoppingCart)
    }
}

impl fmt::Display for UserListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserListKind::Favorite => write!(f, "favorite"),
            UserListKind::ShoppingCart => write!(f, "shopping_cart"),
            UserListKind::Subscription => write!(f, "subscription"),
        }
    }
}

impl FromStr for UserListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "favorite" => Ok(UserListKind::Favorite),
            "shopping_cart" => Ok(UserListKind::ShoppingCart),
            "subscription" => Ok(UserListKind::Subscription),
            _ => Err(format!("Invalid user list kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_kind_string_conversion() {
        assert_eq!(UserListKind::Favorite.to_string(), "favorite");
        assert_eq!(UserListKind::ShoppingCart.to_string(), "shopping_cart");
        assert_eq!(UserListKind::Subscription.to_string(), "subscription");

        for kind in UserListKind::ALL {
            assert_eq!(kind.to_string().parse::<UserListKind>().unwrap(), kind);
        }
        assert_eq!(
            "SHOPPING_CART".parse::<UserListKind>().unwrap(),
            UserListKind::ShoppingCart
        );

        assert!("wishlist".parse::<UserListKind>().is_err());
    }

    #[test]
    fn test_holds_recipes() {
        assert!(UserListKind::Favorite.holds_recipes());
        assert!(UserListKind::ShoppingCart.holds_recipes());
        assert!(!UserListKind::Subscription.holds_recipes());
    }

    #[test]
    fn test_serde_serialization() {
        let json = serde_json::to_string(&UserListKind::ShoppingCart).unwrap();
        assert_eq!(json, "\"shopping_cart\"");

        let deserialized: UserListKind = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, UserListKind::ShoppingCart);
    }
}
