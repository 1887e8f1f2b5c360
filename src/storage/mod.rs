// 🗄️ Storage abstraction - interchangeable account stores
//
// Both providers speak the same logical schema: one record per account with
// an explicit `account_type` discriminator. Records that fail to map back to
// a valid account (unknown discriminator, out-of-range values) are a storage
// error, never silently dropped.

pub mod json_store;
pub mod sqlite_store;

pub use json_store::JsonStore;
pub use sqlite_store::SqliteStore;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountKind};
use crate::config::{Config, StorageBackend};
use crate::error::BankError;

// ============================================================================
// STORE CAPABILITY
// ============================================================================

/// Uniform capability set over the backing store. Implementations hold only
/// a location and open/release their backing resource on every call, so a
/// store can be shared across threads.
///
/// Accounts returned here are detached copies; callers persist mutations
/// explicitly via `update_balance` or `save_all`.
pub trait AccountStore: Send + Sync {
    /// All stored accounts. Empty Vec when no backing data exists yet;
    /// storage error when backing data is present but unreadable.
    fn load_all(&self) -> Result<Vec<Account>, BankError>;

    /// Full sync of the backing store from the given list. The relational
    /// store upserts by owner, so accounts absent from the list survive.
    fn save_all(&self, accounts: &[Account]) -> Result<(), BankError>;

    /// Case-insensitive, trimmed owner-name check.
    fn exists_by_name(&self, name: &str) -> Result<bool, BankError>;

    /// Case-insensitive, trimmed owner lookup. First match wins when several
    /// stored owners normalize to the same name.
    fn find_by_name(&self, name: &str) -> Result<Account, BankError>;

    /// Exactly 3 free name candidates of the form `{name}{2-digit}`.
    fn suggest_names(&self, name: &str) -> Result<Vec<String>, BankError>;

    /// Persist one new account; duplicate owner names fail with the 3
    /// suggested alternatives embedded in the error.
    fn add(&self, account: &Account) -> Result<(), BankError>;

    /// Persist only the balance of an existing account.
    fn update_balance(&self, account: &Account) -> Result<(), BankError>;
}

// ============================================================================
// RECORD SCHEMA
// ============================================================================

/// Durable representation shared by both stores. The variant payload is a
/// discriminated union tagged on `account_type`, so an unrecognized
/// discriminator fails deserialization loudly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub owner: String,
    pub balance: f64,
    #[serde(flatten)]
    pub kind: AccountKind,
}

impl AccountRecord {
    pub fn from_account(account: &Account) -> Self {
        AccountRecord {
            owner: account.owner().to_string(),
            balance: account.balance(),
            kind: account.kind().clone(),
        }
    }

    /// Rebuild the entity, re-running its validation. A stored record that
    /// no longer satisfies the account invariants is corrupt data.
    pub fn into_account(self) -> Result<Account, BankError> {
        Account::new(self.owner, self.balance, self.kind)
            .map_err(|e| BankError::Storage(format!("stored record rejected: {e}")))
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Owner-name normalization used by every lookup.
pub(crate) fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Generate 3 distinct candidates `{name}{10..99}` colliding neither with
/// `taken` (normalized owner names) nor with each other. Random draws first;
/// a deterministic scan finishes the job when the 2-digit space is nearly
/// full, so this terminates even on adversarial stores.
pub(crate) fn suggest_free_names(name: &str, taken: &[String]) -> Result<Vec<String>, BankError> {
    let mut suggestions: Vec<String> = Vec::new();
    let mut rng = rand::thread_rng();

    let is_free = |candidate: &str, suggestions: &[String]| {
        let lower = candidate.to_lowercase();
        !taken.contains(&lower) && !suggestions.iter().any(|s| s.to_lowercase() == lower)
    };

    for _ in 0..500 {
        if suggestions.len() == 3 {
            break;
        }
        let nr: u32 = rng.gen_range(10..100);
        let candidate = format!("{name}{nr}");
        if is_free(&candidate, &suggestions) {
            suggestions.push(candidate);
        }
    }

    for nr in 10..100 {
        if suggestions.len() == 3 {
            break;
        }
        let candidate = format!("{name}{nr}");
        if is_free(&candidate, &suggestions) {
            suggestions.push(candidate);
        }
    }

    if suggestions.len() < 3 {
        return Err(BankError::DomainRule(format!(
            "no free name suggestions left for '{name}'"
        )));
    }
    Ok(suggestions)
}

// ============================================================================
// FACTORY & SEEDING
// ============================================================================

/// Select the store implementation from the configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn AccountStore>, BankError> {
    match config.backend {
        StorageBackend::Json => {
            tracing::info!(path = %config.json_path.display(), "factory: using JSON storage");
            Ok(Box::new(JsonStore::new(&config.json_path)))
        }
        StorageBackend::Sqlite => {
            tracing::info!(path = %config.db_path.display(), "factory: using SQLite storage");
            Ok(Box::new(SqliteStore::open(&config.db_path)?))
        }
    }
}

/// Write the default dataset when the store is empty. Returns true when
/// seeding happened.
pub fn ensure_seed_accounts(store: &dyn AccountStore) -> Result<bool, BankError> {
    if !store.load_all()?.is_empty() {
        return Ok(false);
    }

    let defaults = vec![
        Account::checking("Tom", 500.0, 200.0)?,
        Account::savings("Jim", 1000.0, 2.0)?,
    ];
    store.save_all(&defaults)?;
    tracing::info!("seeded default accounts (Tom, Jim)");
    Ok(true)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let account = Account::checking("Tom", 500.0, 200.0).unwrap();
        let record = AccountRecord::from_account(&account);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"account_type\":\"Checking\""));
        assert!(json.contains("\"overdraft_limit\":200.0"));

        let parsed: AccountRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.into_account().unwrap(), account);
    }

    #[test]
    fn test_unknown_discriminator_fails_loudly() {
        let json = r#"{"owner":"X","balance":10.0,"account_type":"Depot","extra":1.0}"#;
        let result: Result<AccountRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_stored_values_become_storage_errors() {
        let json = r#"{"owner":"X","balance":-5.0,"account_type":"Savings","interest_rate":2.0}"#;
        let record: AccountRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(
            record.into_account(),
            Err(BankError::Storage(_))
        ));
    }

    #[test]
    fn test_suggestions_are_distinct_and_free() {
        let taken: Vec<String> = vec!["tom".to_string(), "tom42".to_string()];
        let suggestions = suggest_free_names("Tom", &taken).unwrap();

        assert_eq!(suggestions.len(), 3);
        for s in &suggestions {
            assert!(s.starts_with("Tom"));
            assert!(!taken.contains(&s.to_lowercase()));
        }
        let mut deduped = suggestions.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 3);
    }

    #[test]
    fn test_suggestions_survive_a_nearly_full_namespace() {
        // Occupy all but three 2-digit slots
        let taken: Vec<String> = (10..97).map(|nr| format!("tom{nr}")).collect();
        let suggestions = suggest_free_names("Tom", &taken).unwrap();

        let mut got: Vec<String> = suggestions.iter().map(|s| s.to_lowercase()).collect();
        got.sort();
        assert_eq!(got, vec!["tom97", "tom98", "tom99"]);
    }

    #[test]
    fn test_suggestions_error_when_namespace_exhausted() {
        let taken: Vec<String> = (10..100).map(|nr| format!("tom{nr}")).collect();
        assert!(suggest_free_names("Tom", &taken).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Tom "), "tom");
        assert_eq!(normalize("JIM"), "jim");
    }
}
