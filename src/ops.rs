// 🏦 Domain operations - one function per endpoint
//
// Every operation takes the store it works against (no global storage
// handle) and, where gated, an already-verified identity. Role checks run
// before any domain logic. Write operations follow the same cycle:
// find the account, let the entity mutate itself, persist the balance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::Account;
use crate::auth::{Identity, Role};
use crate::error::BankError;
use crate::storage::AccountStore;

// ============================================================================
// REQUEST / RECEIPT TYPES
// ============================================================================

/// Returned by every successful balance mutation.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReceipt {
    pub message: String,
    pub owner: String,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    /// "checking"/"giro" or "savings"/"spar"
    pub account_type: String,
    pub start_balance: f64,
    /// Overdraft limit for Checking, interest rate for Savings
    pub extra: f64,
}

// ============================================================================
// AMOUNT COERCION
// ============================================================================

/// Accept amounts as JSON numbers or numeric strings; anything else is a
/// type error.
pub fn coerce_amount(value: &Value) -> Result<f64, BankError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| BankError::Validation("the amount must be a number".to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| BankError::Validation(format!("'{s}' is not a number"))),
        _ => Err(BankError::Validation(
            "the amount must be a number".to_string(),
        )),
    }
}

// ============================================================================
// ROLE ENFORCEMENT
// ============================================================================

fn require_role(identity: &Identity, allowed: &[Role], action: &str) -> Result<(), BankError> {
    if allowed.contains(&identity.role) {
        return Ok(());
    }
    tracing::warn!(
        user = %identity.username,
        role = identity.role.as_str(),
        action,
        "access denied"
    );
    Err(BankError::Auth(format!(
        "user '{}' is not allowed to {action}",
        identity.username
    )))
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// List every stored account. Unauthenticated.
pub fn list_accounts(store: &dyn AccountStore) -> Result<Vec<Account>, BankError> {
    store.load_all()
}

/// Deposit into the named account. Admin or viewer.
pub fn deposit(
    store: &dyn AccountStore,
    identity: &Identity,
    name: &str,
    amount: f64,
) -> Result<TransactionReceipt, BankError> {
    require_role(identity, &[Role::Admin, Role::Viewer], "make transactions")?;

    let mut account = store.find_by_name(name)?;
    let message = account.deposit(amount)?;
    store.update_balance(&account)?;

    tracing::info!(
        user = %identity.username,
        owner = account.owner(),
        amount,
        "deposit booked"
    );
    Ok(TransactionReceipt {
        message,
        owner: account.owner().to_string(),
        new_balance: account.balance(),
    })
}

/// Withdraw from the named account, honoring the variant's limit. Admin or
/// viewer.
pub fn withdraw(
    store: &dyn AccountStore,
    identity: &Identity,
    name: &str,
    amount: f64,
) -> Result<TransactionReceipt, BankError> {
    require_role(identity, &[Role::Admin, Role::Viewer], "make transactions")?;

    let mut account = store.find_by_name(name)?;
    let message = account.withdraw(amount)?;
    store.update_balance(&account)?;

    tracing::info!(
        user = %identity.username,
        owner = account.owner(),
        amount,
        "withdrawal booked"
    );
    Ok(TransactionReceipt {
        message,
        owner: account.owner().to_string(),
        new_balance: account.balance(),
    })
}

/// All accounts whose owner contains the query, case-insensitively.
/// Unauthenticated; an empty result is not an error.
pub fn search(store: &dyn AccountStore, query: &str) -> Result<Vec<Account>, BankError> {
    let needle = query.trim().to_lowercase();
    Ok(store
        .load_all()?
        .into_iter()
        .filter(|account| account.owner().to_lowercase().contains(&needle))
        .collect())
}

/// Create and persist a new account. Admin only.
pub fn create_account(
    store: &dyn AccountStore,
    identity: &Identity,
    request: &CreateAccountRequest,
) -> Result<Account, BankError> {
    require_role(identity, &[Role::Admin], "create accounts")?;

    let account = match request.account_type.trim().to_lowercase().as_str() {
        "checking" | "giro" => {
            Account::checking(request.name.trim(), request.start_balance, request.extra)?
        }
        "savings" | "spar" => {
            Account::savings(request.name.trim(), request.start_balance, request.extra)?
        }
        other => {
            return Err(BankError::Validation(format!(
                "invalid account type '{other}'. Allowed: 'checking' or 'savings'"
            )));
        }
    };

    store.add(&account)?;
    tracing::info!(
        admin = %identity.username,
        owner = account.owner(),
        kind = account.kind().as_str(),
        "account created"
    );
    Ok(account)
}

/// Permanently credit the stored interest rate. Admin only; fails for
/// non-savings accounts.
pub fn credit_interest(
    store: &dyn AccountStore,
    identity: &Identity,
    name: &str,
) -> Result<TransactionReceipt, BankError> {
    require_role(identity, &[Role::Admin], "credit interest")?;

    let mut account = store.find_by_name(name)?;
    let message = account.credit_interest()?;
    store.update_balance(&account)?;

    tracing::info!(
        admin = %identity.username,
        owner = account.owner(),
        "interest credited"
    );
    Ok(TransactionReceipt {
        message,
        owner: account.owner().to_string(),
        new_balance: account.balance(),
    })
}

/// Run the interest computation with a substitute rate on a detached copy.
/// Nothing is persisted. Unauthenticated.
pub fn simulate_interest(
    store: &dyn AccountStore,
    name: &str,
    rate: f64,
) -> Result<String, BankError> {
    let mut account = store.find_by_name(name)?;
    account.simulate_interest(rate)
}

// ============================================================================
// TESTS
// ============================================================================
