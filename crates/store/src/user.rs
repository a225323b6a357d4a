//! User records with embedded carts.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parses a stored role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns the role name as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user account.
///
/// The cart lives inside the user record, mirroring the embedded-document
/// shape it is served in. `password_hash` is `None` for accounts created
/// through a social identity provider; such accounts cannot log in locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub cart: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user account with an empty cart and the default role.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: Option<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password_hash,
            role: Role::User,
            cart: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns true if the account has the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns the cart line for a product, if present.
    pub fn cart_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.cart.iter().find(|item| item.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_with_empty_cart_and_user_role() {
        let user = User::new("alice", "alice@example.com", Some("hash".into()));
        assert!(user.cart.is_empty());
        assert_eq!(user.role, Role::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn role_parse_roundtrip() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new("bob", "bob@example.com", Some("secret-hash".into()));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("bob@example.com"));
    }

    #[test]
    fn cart_item_wire_naming_is_camel_case() {
        let item = CartItem {
            product_id: ProductId::new(),
            quantity: 2,
        };
        let json = serde_json::to_value(item).unwrap();
        assert!(json.get("productId").is_some());
        assert_eq!(json["quantity"], 2);
    }
}
