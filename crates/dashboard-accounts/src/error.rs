//! Account Error Types

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, AccountError>;

/// Errors from accounts, sync codes, orders and persistence
#[derive(Error, Debug)]
pub enum AccountError {
    /// Signup collided with an existing username
    #[error("Username taken")]
    UsernameTaken { suggestions: Vec<String> },

    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Operation needs a logged-in user
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sync code never existed or was already used
    #[error("Invalid or expired code")]
    SyncCodeInvalid,

    #[error("Code has expired")]
    SyncCodeExpired,

    #[error("Enter a valid quantity")]
    InvalidQuantity,

    #[error("Enter a valid limit price")]
    InvalidLimitPrice,

    /// Sell larger than the held balance
    #[error("Insufficient {symbol} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        symbol: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Simulated payment did not go through
    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AccountError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Payment(_) | Self::Storage(_) | Self::Io(_))
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UsernameTaken { .. } => "USERNAME_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotLoggedIn => "NO_USER",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::SyncCodeInvalid => "SYNC_CODE_INVALID",
            Self::SyncCodeExpired => "SYNC_CODE_EXPIRED",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidLimitPrice => "INVALID_LIMIT_PRICE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::AssetNotFound(_) => "ASSET_NOT_FOUND",
            Self::Payment(_) => "PAYMENT_FAILED",
            Self::Hashing(_) | Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => {
                "INTERNAL"
            }
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::UsernameTaken { .. } => "That username is taken. Try one of the suggestions.".into(),
            Self::InvalidCredentials => "Invalid username or password.".into(),
            Self::NotLoggedIn => "Please login or signup to continue.".into(),
            Self::Payment(_) => "Transaction failed. Please try again.".into(),
            Self::InvalidInput(_)
            | Self::SyncCodeInvalid
            | Self::SyncCodeExpired
            | Self::InvalidQuantity
            | Self::InvalidLimitPrice
            | Self::InsufficientBalance { .. }
            | Self::AssetNotFound(_) => self.to_string(),
            Self::Hashing(_) | Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => {
                "An error occurred processing your request.".into()
            }
        }
    }
}
