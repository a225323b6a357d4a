//! Domain error types.

use common::{Money, OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Order placement was submitted without any line items.
    #[error("cart is empty")]
    EmptyCart,

    /// A required request field was missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A quantity was outside the accepted range.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// A price was outside the accepted range.
    #[error("invalid price: {0}")]
    InvalidPrice(Money),

    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds the stock on hand.
    #[error("not enough stock available for {name}. Available: {available}")]
    InsufficientStock { name: String, available: u32 },

    /// The client-submitted total disagrees with the server-computed one.
    #[error("submitted total {submitted} does not match computed total {computed}")]
    TotalMismatch { submitted: Money, computed: Money },

    /// A status string outside the allow-list.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// The referenced order does not exist (or belongs to another user).
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// Signup with a username or email already on record.
    #[error("user already exists")]
    UserExists,

    /// Profile update to a username already on record.
    #[error("username is already taken")]
    UsernameTaken,

    /// Profile update to an email already on record.
    #[error("email is already in use")]
    EmailTaken,

    /// Username shorter than the minimum length.
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },

    /// Password shorter than the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Login with an unknown username or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Cart update for a product that is not in the cart.
    #[error("product not in cart: {0}")]
    NotInCart(ProductId),

    /// Password hashing or verification failed internally.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// An error occurred in the store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
