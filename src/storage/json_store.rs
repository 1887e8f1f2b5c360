// 📄 JSON file store
// One flat file holding the whole account collection; every write rewrites
// the file from the caller's snapshot. No partial-write primitive exists, so
// `add` and `update_balance` are load-modify-save cycles.

use std::fs;
use std::path::{Path, PathBuf};

use crate::account::Account;
use crate::error::BankError;
use crate::storage::{normalize, suggest_free_names, AccountRecord, AccountStore};

pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_records(&self) -> Result<Vec<AccountRecord>, BankError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            BankError::Storage(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            BankError::Storage(format!("corrupt JSON data in {}: {e}", self.path.display()))
        })
    }
}

impl AccountStore for JsonStore {
    fn load_all(&self) -> Result<Vec<Account>, BankError> {
        let accounts = self
            .read_records()?
            .into_iter()
            .map(AccountRecord::into_account)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(path = %self.path.display(), count = accounts.len(), "JSON data loaded");
        Ok(accounts)
    }

    fn save_all(&self, accounts: &[Account]) -> Result<(), BankError> {
        let records: Vec<AccountRecord> =
            accounts.iter().map(AccountRecord::from_account).collect();
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json).map_err(|e| {
            BankError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;
        tracing::info!(path = %self.path.display(), count = accounts.len(), "JSON data saved");
        Ok(())
    }

    fn exists_by_name(&self, name: &str) -> Result<bool, BankError> {
        let needle = normalize(name);
        Ok(self
            .load_all()?
            .iter()
            .any(|account| normalize(account.owner()) == needle))
    }

    fn find_by_name(&self, name: &str) -> Result<Account, BankError> {
        let needle = normalize(name);
        let found = self
            .load_all()?
            .into_iter()
            .find(|account| normalize(account.owner()) == needle);

        found.ok_or_else(|| {
            tracing::warn!(name, path = %self.path.display(), "account not found");
            BankError::NotFound {
                name: name.trim().to_string(),
            }
        })
    }

    fn suggest_names(&self, name: &str) -> Result<Vec<String>, BankError> {
        let taken: Vec<String> = self
            .load_all()?
            .iter()
            .map(|account| normalize(account.owner()))
            .collect();
        suggest_free_names(name, &taken)
    }

    fn add(&self, account: &Account) -> Result<(), BankError> {
        if self.exists_by_name(account.owner())? {
            let suggestions = self.suggest_names(account.owner())?;
            tracing::warn!(owner = account.owner(), "duplicate account rejected (JSON)");
            return Err(BankError::DuplicateName {
                name: account.owner().to_string(),
                suggestions,
            });
        }

        let mut accounts = self.load_all()?;
        accounts.push(account.clone());
        tracing::info!(
            owner = account.owner(),
            kind = account.kind().as_str(),
            "new account created (JSON)"
        );
        self.save_all(&accounts)
    }

    fn update_balance(&self, account: &Account) -> Result<(), BankError> {
        let needle = normalize(account.owner());
        let mut accounts = self.load_all()?;

        let slot = accounts
            .iter_mut()
            .find(|a| normalize(a.owner()) == needle)
            .ok_or_else(|| BankError::NotFound {
                name: account.owner().to_string(),
            })?;
        *slot = account.clone();

        self.save_all(&accounts)
    }
}

// ============================================================================
// TESTS
// ============================================================================
