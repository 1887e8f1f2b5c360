// 🗃️ SQLite store
// One table with a UNIQUE constraint on the owner name. The constraint is
// the authority on duplicates: the advisory existence check only exists to
// produce name suggestions, and a constraint violation from the INSERT maps
// to the same duplicate error.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::account::{Account, AccountKind};
use crate::error::BankError;
use crate::storage::{normalize, suggest_free_names, AccountStore};

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the store and create the schema if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// A fresh connection per call; released when it goes out of scope.
    fn connect(&self) -> Result<Connection, BankError> {
        Connection::open(&self.path).map_err(Into::into)
    }

    fn init_schema(&self) -> Result<(), BankError> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS konten (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL UNIQUE,
                balance REAL NOT NULL,
                account_type TEXT NOT NULL,
                extra REAL
            )",
            [],
        )?;
        tracing::info!(path = %self.path.display(), "SQLite schema initialized");
        Ok(())
    }

    /// The single `extra` column carries the variant payload, dispatched on
    /// the discriminator.
    fn extra_value(account: &Account) -> f64 {
        match account.kind() {
            AccountKind::Checking { overdraft_limit } => *overdraft_limit,
            AccountKind::Savings { interest_rate } => *interest_rate,
        }
    }

    fn build_account(
        owner: String,
        balance: f64,
        account_type: &str,
        extra: Option<f64>,
    ) -> Result<Account, BankError> {
        let extra = extra.unwrap_or(0.0);
        let account = match account_type {
            "Checking" => Account::checking(owner, balance, extra),
            "Savings" => Account::savings(owner, balance, extra),
            other => {
                return Err(BankError::Storage(format!(
                    "unknown account type '{other}' stored for '{owner}'"
                )));
            }
        };
        account.map_err(|e| BankError::Storage(format!("stored record rejected: {e}")))
    }

    fn fetch_rows(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<(String, f64, String, Option<f64>)>, BankError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl AccountStore for SqliteStore {
    fn load_all(&self) -> Result<Vec<Account>, BankError> {
        let conn = self.connect()?;
        let rows = Self::fetch_rows(
            &conn,
            "SELECT owner, balance, account_type, extra FROM konten ORDER BY id",
            [],
        )?;

        let accounts = rows
            .into_iter()
            .map(|(owner, balance, account_type, extra)| {
                Self::build_account(owner, balance, &account_type, extra)
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = accounts.len(), "SQLite: accounts loaded");
        Ok(accounts)
    }

    fn save_all(&self, accounts: &[Account]) -> Result<(), BankError> {
        if accounts.is_empty() {
            tracing::info!("SQLite: nothing to sync");
            return Ok(());
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for account in accounts {
            // Upsert via the UNIQUE constraint on owner; accounts absent
            // from the list are not touched.
            tx.execute(
                "INSERT OR REPLACE INTO konten (owner, balance, account_type, extra)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.owner(),
                    account.balance(),
                    account.kind().as_str(),
                    Self::extra_value(account),
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = accounts.len(), "SQLite: sync complete");
        Ok(())
    }

    fn exists_by_name(&self, name: &str) -> Result<bool, BankError> {
        let conn = self.connect()?;
        let hit: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM konten WHERE LOWER(owner) = ?1 LIMIT 1",
                params![normalize(name)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    fn find_by_name(&self, name: &str) -> Result<Account, BankError> {
        let conn = self.connect()?;
        let rows = Self::fetch_rows(
            &conn,
            "SELECT owner, balance, account_type, extra FROM konten
             WHERE LOWER(owner) = ?1 ORDER BY id LIMIT 1",
            params![normalize(name)],
        )?;

        match rows.into_iter().next() {
            Some((owner, balance, account_type, extra)) => {
                Self::build_account(owner, balance, &account_type, extra)
            }
            None => {
                tracing::warn!(name, "SQLite: account not found");
                Err(BankError::NotFound {
                    name: name.trim().to_string(),
                })
            }
        }
    }

    fn suggest_names(&self, name: &str) -> Result<Vec<String>, BankError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT owner FROM konten")?;
        let taken = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .iter()
            .map(|owner| normalize(owner))
            .collect::<Vec<_>>();
        suggest_free_names(name, &taken)
    }

    fn add(&self, account: &Account) -> Result<(), BankError> {
        // Advisory check; the UNIQUE constraint below is the authority.
        if self.exists_by_name(account.owner())? {
            let suggestions = self.suggest_names(account.owner())?;
            tracing::warn!(owner = account.owner(), "duplicate account rejected (SQLite)");
            return Err(BankError::DuplicateName {
                name: account.owner().to_string(),
                suggestions,
            });
        }

        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO konten (owner, balance, account_type, extra)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.owner(),
                account.balance(),
                account.kind().as_str(),
                Self::extra_value(account),
            ],
        );

        match result {
            Ok(_) => {
                tracing::info!(
                    owner = account.owner(),
                    kind = account.kind().as_str(),
                    "new account created (SQLite)"
                );
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // A concurrent insert won the race between check and insert
                tracing::warn!(owner = account.owner(), "UNIQUE constraint hit on insert");
                let suggestions = self.suggest_names(account.owner())?;
                Err(BankError::DuplicateName {
                    name: account.owner().to_string(),
                    suggestions,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_balance(&self, account: &Account) -> Result<(), BankError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE konten SET balance = ?1 WHERE LOWER(owner) = ?2",
            params![account.balance(), normalize(account.owner())],
        )?;

        if changed == 0 {
            return Err(BankError::NotFound {
                name: account.owner().to_string(),
            });
        }
        tracing::info!(owner = account.owner(), "SQLite: balance updated");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
