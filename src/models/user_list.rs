use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartEntry, UserListKind};

/// Membership of a recipe or author in one of a user's lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListEntry {
    pub user_id: String,
    pub kind: UserListKind,
    pub target_id: String,
    pub added_at: DateTime<Utc>,
}

impl UserListEntry {
    pub fn new(user_id: &str, kind: UserListKind, target_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            target_id: target_id.to_string(),
            added_at: Utc::now(),
        }
    }

    /// Sort key within the user's partition: `<kind>#<target_id>`
    pub fn list_key(&self) -> String {
        Self::key_for(self.kind, &self.target_id)
    }

    pub fn key_for(kind: UserListKind, target_id: &str) -> String {
        format!("{}#{}", kind, target_id)
    }

    pub fn key_prefix(kind: UserListKind) -> String {
        format!("{}#", kind)
    }

    /// Split a stored sort key back into kind and target id
    pub fn parse_list_key(list_key: &str) -> Option<(UserListKind, String)> {
        let (kind, target_id) = list_key.split_once('#')?;
        let kind = kind.parse().ok()?;
        if target_id.is_empty() {
            return None;
        }
        Some((kind, target_id.to_string()))
    }

    pub fn to_cart_entry(&self) -> CartEntry {
        CartEntry::new(self.target_id.clone())
    }
}

/// Oldest first; ties broken by target id
pub fn sort_by_added(entries: &mut [UserListEntry]) {
    entries.sort_by(|a, b| {
        a.added_at
            .cmp(&b.added_at)
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_list_key_round_trip() {
        let entry = UserListEntry::new("U1", UserListKind::ShoppingCart, "R1");

        assert_eq!(entry.list_key(), "shopping_cart#R1");
        assert_eq!(
            UserListEntry::parse_list_key(&entry.list_key()),
            Some((UserListKind::ShoppingCart, "R1".to_string()))
        );
        assert_eq!(UserListEntry::parse_list_key("shopping_cart#"), None);
        assert_eq!(UserListEntry::parse_list_key("wishlist#R1"), None);
        assert_eq!(UserListEntry::parse_list_key("R1"), None);
    }

    #[test]
    fn test_sort_by_added() {
        let mut first = UserListEntry::new("U1", UserListKind::Favorite, "R9");
        let second = UserListEntry::new("U1", UserListKind::Favorite, "R1");
        first.added_at = second.added_at - Duration::seconds(10);

        let mut entries = vec![second.clone(), first.clone()];
        sort_by_added(&mut entries);

        assert_eq!(entries[0].target_id, "R9");
        assert_eq!(entries[1].target_id, "R1");
        assert_eq!(entries[0].to_cart_entry(), CartEntry::new("R9"));
    }
}
