// Bank Management API - Core Library
// Exposes the account domain, storage providers, and auth capability
// for use in the CLI, the API server, and tests.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod ops;
pub mod storage;

// Re-export commonly used types
pub use account::{Account, AccountKind};
pub use auth::{AuthProvider, Identity, Role, TokenAuthProvider, UserTable};
pub use config::{Config, StorageBackend};
pub use error::BankError;
pub use ops::{
    coerce_amount, create_account, credit_interest, deposit, list_accounts, search,
    simulate_interest, withdraw, CreateAccountRequest, TransactionReceipt,
};
pub use storage::{
    ensure_seed_accounts, open_store, AccountRecord, AccountStore, JsonStore, SqliteStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
