// 💳 Account Entity - Checking and Savings accounts with validated balances
//
// The two variants share owner + balance and differ in one payload field:
// Checking carries an overdraft limit (balance may go down to -limit),
// Savings carries an interest rate (balance never goes below zero).
// Every balance assignment runs through `set_balance`, so the floor invariant
// holds at construction and after every mutation alike.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BankError;

// ============================================================================
// ACCOUNT VARIANTS
// ============================================================================

/// Variant payload, also the discriminated union used in the serialized
/// record schema (tagged on `account_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "account_type")]
pub enum AccountKind {
    /// Checking account ("Giro"): may be overdrawn up to the limit
    Checking { overdraft_limit: f64 },

    /// Savings account ("Spar"): interest-bearing, never negative
    Savings { interest_rate: f64 },
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking { .. } => "Checking",
            AccountKind::Savings { .. } => "Savings",
        }
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// A validated bank account. Fields are private: mutation only happens
/// through `deposit`, `withdraw` and the interest operations, each of which
/// enforces the balance floor.
///
/// An `Account` returned by a store is a detached copy; callers persist
/// changes explicitly through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    owner: String,
    balance: f64,
    kind: AccountKind,
}

impl Account {
    /// Create a validated account. Checks the variant payload first, then
    /// runs the initial balance through the same validation as any later
    /// assignment.
    pub fn new(
        owner: impl Into<String>,
        balance: f64,
        kind: AccountKind,
    ) -> Result<Self, BankError> {
        match &kind {
            AccountKind::Checking { overdraft_limit } => {
                if !overdraft_limit.is_finite() {
                    return Err(BankError::Validation(
                        "Checking: the overdraft limit must be a number".to_string(),
                    ));
                }
                if *overdraft_limit < 0.0 {
                    return Err(BankError::DomainRule(
                        "Checking: the overdraft limit must not be negative".to_string(),
                    ));
                }
            }
            AccountKind::Savings { interest_rate } => {
                if !interest_rate.is_finite() {
                    return Err(BankError::Validation(
                        "Savings: the interest rate must be a number".to_string(),
                    ));
                }
                if *interest_rate < 0.0 {
                    return Err(BankError::DomainRule(
                        "Savings: the interest rate must not be negative".to_string(),
                    ));
                }
            }
        }

        let mut account = Account {
            owner: owner.into(),
            balance: 0.0,
            kind,
        };
        account.set_balance(balance)?;
        Ok(account)
    }

    /// Shorthand for a Checking account.
    pub fn checking(
        owner: impl Into<String>,
        balance: f64,
        overdraft_limit: f64,
    ) -> Result<Self, BankError> {
        Self::new(owner, balance, AccountKind::Checking { overdraft_limit })
    }

    /// Shorthand for a Savings account.
    pub fn savings(
        owner: impl Into<String>,
        balance: f64,
        interest_rate: f64,
    ) -> Result<Self, BankError> {
        Self::new(owner, balance, AccountKind::Savings { interest_rate })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    /// Lowest balance this account may reach.
    fn floor(&self) -> f64 {
        match &self.kind {
            AccountKind::Checking { overdraft_limit } => -overdraft_limit,
            AccountKind::Savings { .. } => 0.0,
        }
    }

    /// Funds available for withdrawal (balance plus overdraft for Checking).
    pub fn available_funds(&self) -> f64 {
        self.balance - self.floor()
    }

    /// Assign a new balance, enforcing the variant's floor. Used by every
    /// mutating operation; never bypassed.
    fn set_balance(&mut self, balance: f64) -> Result<(), BankError> {
        if !balance.is_finite() {
            return Err(BankError::Validation(
                "the balance must be a number".to_string(),
            ));
        }
        if balance < self.floor() {
            return Err(match &self.kind {
                AccountKind::Checking { overdraft_limit } => BankError::DomainRule(format!(
                    "Checking: overdraft limit of {overdraft_limit:.2} EUR exceeded"
                )),
                AccountKind::Savings { .. } => BankError::DomainRule(
                    "the balance must not be negative".to_string(),
                ),
            });
        }
        self.balance = balance;
        Ok(())
    }

    /// Increase the balance by a positive amount.
    pub fn deposit(&mut self, amount: f64) -> Result<String, BankError> {
        if !amount.is_finite() {
            return Err(BankError::Validation(
                "deposit: the amount must be a number".to_string(),
            ));
        }
        if amount <= 0.0 {
            return Err(BankError::DomainRule(
                "deposit: the amount must be greater than 0".to_string(),
            ));
        }
        self.set_balance(self.balance + amount)?;
        Ok(format!(
            "{amount:.2} EUR deposited. New balance: {:.2} EUR",
            self.balance
        ))
    }

    /// Withdraw a positive amount within the available funds. For Checking
    /// accounts the rejection message reports what is still available.
    pub fn withdraw(&mut self, amount: f64) -> Result<String, BankError> {
        if !amount.is_finite() {
            return Err(BankError::Validation(
                "withdraw: the amount must be a number".to_string(),
            ));
        }
        if amount <= 0.0 {
            return Err(BankError::DomainRule(
                "withdraw: the amount must be positive".to_string(),
            ));
        }
        if amount > self.available_funds() {
            return Err(match &self.kind {
                AccountKind::Checking { .. } => BankError::DomainRule(format!(
                    "withdraw: limit exceeded. Available: {:.2} EUR",
                    self.available_funds()
                )),
                AccountKind::Savings { .. } => BankError::DomainRule(
                    "withdraw: the amount exceeds the balance".to_string(),
                ),
            });
        }
        self.set_balance(self.balance - amount)?;
        Ok(format!(
            "{amount:.2} EUR withdrawn. New balance: {:.2} EUR",
            self.balance
        ))
    }

    /// Apply the stored interest rate to the balance (Savings only).
    /// Permanent.
    pub fn credit_interest(&mut self) -> Result<String, BankError> {
        let rate = match &self.kind {
            AccountKind::Savings { interest_rate } => *interest_rate,
            AccountKind::Checking { .. } => {
                return Err(BankError::DomainRule(format!(
                    "account '{}' is not a savings account and earns no interest",
                    self.owner
                )));
            }
        };
        let factor = 1.0 + rate / 100.0;
        self.set_balance(self.balance * factor)?;
        Ok(format!(
            "Interest credited at {rate}%. New balance: {:.2} EUR",
            self.balance
        ))
    }

    /// Run the interest computation with a substitute rate, then restore the
    /// original balance and rate unconditionally (the guard restores even
    /// when the computation itself fails). Externally this is a pure query.
    pub fn simulate_interest(&mut self, rate: f64) -> Result<String, BankError> {
        if !rate.is_finite() {
            return Err(BankError::Validation(
                "simulation: the rate must be a number".to_string(),
            ));
        }
        if rate <= 0.0 {
            return Err(BankError::DomainRule(
                "simulation: the rate must be greater than 0".to_string(),
            ));
        }
        if !matches!(self.kind, AccountKind::Savings { .. }) {
            return Err(BankError::DomainRule(format!(
                "simulation not available for '{}' (not a savings account)",
                self.owner
            )));
        }

        let result = {
            let mut guard = RestoreOnDrop::new(self);
            if let AccountKind::Savings { interest_rate } = &mut guard.account.kind {
                *interest_rate = rate;
            }
            guard.account.credit_interest()
            // guard drops here: balance and rate are restored on both paths
        };

        result.map(|msg| format!("Simulation successful: {msg}"))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AccountKind::Checking { overdraft_limit } => write!(
                f,
                "Checking: {} | Balance: {:.2} EUR | Overdraft: {overdraft_limit:.2} EUR",
                self.owner, self.balance
            ),
            AccountKind::Savings { interest_rate } => write!(
                f,
                "Savings: {} | Balance: {:.2} EUR | Rate: {interest_rate:.2}%",
                self.owner, self.balance
            ),
        }
    }
}

/// Scoped snapshot of balance + variant payload, written back on drop.
struct RestoreOnDrop<'a> {
    account: &'a mut Account,
    balance: f64,
    kind: AccountKind,
}

impl<'a> RestoreOnDrop<'a> {
    fn new(account: &'a mut Account) -> Self {
        let balance = account.balance;
        let kind = account.kind.clone();
        RestoreOnDrop {
            account,
            balance,
            kind,
        }
    }
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        self.account.balance = self.balance;
        self.account.kind = self.kind.clone();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization() {
        let account = Account::savings("TestUser", 100.0, 0.0).unwrap();
        assert_eq!(account.owner(), "TestUser");
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let result = Account::savings("Cheater", -100.0, 0.0);
        assert!(matches!(result, Err(BankError::DomainRule(_))));
    }

    #[test]
    fn test_non_finite_initial_balance_rejected() {
        let result = Account::savings("Confused", f64::NAN, 0.0);
        assert!(matches!(result, Err(BankError::Validation(_))));
    }

    #[test]
    fn test_deposit_increases_balance() {
        let mut account = Account::savings("TestUser", 100.0, 0.0).unwrap();
        let msg = account.deposit(50.0).unwrap();
        assert_eq!(account.balance(), 150.0);
        assert!(msg.contains("deposited"));
    }

    #[test]
    fn test_deposit_rejects_non_positive_and_non_finite() {
        let mut account = Account::savings("TestUser", 100.0, 0.0).unwrap();
        assert!(matches!(account.deposit(-10.0), Err(BankError::DomainRule(_))));
        assert!(matches!(account.deposit(0.0), Err(BankError::DomainRule(_))));
        assert!(matches!(
            account.deposit(f64::INFINITY),
            Err(BankError::Validation(_))
        ));
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn test_withdraw_decreases_balance() {
        let mut account = Account::savings("TestUser", 100.0, 0.0).unwrap();
        account.withdraw(40.0).unwrap();
        assert_eq!(account.balance(), 60.0);
    }

    #[test]
    fn test_withdraw_over_balance_fails() {
        let mut account = Account::savings("TestUser", 100.0, 0.0).unwrap();
        let result = account.withdraw(150.0);
        assert!(matches!(result, Err(BankError::DomainRule(_))));
        assert_eq!(account.balance(), 100.0);
    }

    #[test]
    fn test_deposit_withdraw_round_trip() {
        let mut account = Account::checking("TestUser", 250.0, 100.0).unwrap();
        account.deposit(75.5).unwrap();
        account.withdraw(75.5).unwrap();
        assert_eq!(account.balance(), 250.0);
    }

    #[test]
    fn test_checking_may_start_overdrawn_within_limit() {
        let account = Account::checking("Max", -100.0, 200.0).unwrap();
        assert_eq!(account.balance(), -100.0);
    }

    #[test]
    fn test_checking_initial_balance_below_limit_rejected() {
        let result = Account::checking("Moritz", -300.0, 200.0);
        assert!(matches!(result, Err(BankError::DomainRule(_))));
    }

    #[test]
    fn test_negative_overdraft_limit_rejected() {
        let result = Account::checking("Susi", 500.0, -50.0);
        assert!(matches!(result, Err(BankError::DomainRule(_))));
    }

    #[test]
    fn test_negative_interest_rate_rejected() {
        let result = Account::savings("Susi", 200.0, -10.0);
        assert!(matches!(result, Err(BankError::DomainRule(_))));
    }

    #[test]
    fn test_checking_withdraw_into_overdraft() {
        // Tom: 500 balance, 200 overdraft -> 650 leaves -150
        let mut giro = Account::checking("Tom", 500.0, 200.0).unwrap();
        giro.withdraw(650.0).unwrap();
        assert_eq!(giro.balance(), -150.0);

        // 50 EUR still available; 51 must fail and report the available amount
        let err = giro.withdraw(51.0).unwrap_err();
        match err {
            BankError::DomainRule(msg) => assert!(msg.contains("50.00 EUR"), "got: {msg}"),
            other => panic!("expected DomainRule, got {other:?}"),
        }
        assert_eq!(giro.balance(), -150.0);
    }

    #[test]
    fn test_checking_withdraw_boundary_is_inclusive() {
        let mut giro = Account::checking("Tom", 500.0, 200.0).unwrap();
        // Exactly balance + limit succeeds
        giro.withdraw(700.0).unwrap();
        assert_eq!(giro.balance(), -200.0);

        let mut giro2 = Account::checking("Tom", 500.0, 200.0).unwrap();
        // One unit over fails
        assert!(giro2.withdraw(701.0).is_err());
        assert_eq!(giro2.balance(), 500.0);
    }

    #[test]
    fn test_interest_crediting() {
        // 2% on 1000 EUR is exactly 1020 EUR
        let mut spar = Account::savings("Jim", 1000.0, 2.0).unwrap();
        spar.credit_interest().unwrap();
        assert_eq!(spar.balance(), 1020.0);
    }

    #[test]
    fn test_interest_on_checking_rejected() {
        let mut giro = Account::checking("Tom", 500.0, 200.0).unwrap();
        assert!(matches!(
            giro.credit_interest(),
            Err(BankError::DomainRule(_))
        ));
        assert_eq!(giro.balance(), 500.0);
    }

    #[test]
    fn test_simulation_leaves_state_untouched() {
        let mut spar = Account::savings("Jim", 1000.0, 2.0).unwrap();
        let msg = spar.simulate_interest(5.0).unwrap();

        assert!(msg.contains("Simulation successful"));
        assert!(msg.contains("1050.00 EUR"));
        assert_eq!(spar.balance(), 1000.0);
        assert_eq!(spar.kind(), &AccountKind::Savings { interest_rate: 2.0 });
    }

    #[test]
    fn test_simulation_restores_even_when_computation_fails() {
        // A huge rate drives the projected balance to infinity, which the
        // balance validation rejects mid-computation.
        let mut spar = Account::savings("Jim", 1000.0, 2.0).unwrap();
        let result = spar.simulate_interest(f64::MAX);

        assert!(result.is_err());
        assert_eq!(spar.balance(), 1000.0);
        assert_eq!(spar.kind(), &AccountKind::Savings { interest_rate: 2.0 });
    }

    #[test]
    fn test_simulation_rejects_invalid_rates() {
        let mut spar = Account::savings("Jim", 1000.0, 2.0).unwrap();
        assert!(matches!(
            spar.simulate_interest(-5.0),
            Err(BankError::DomainRule(_))
        ));
        assert!(matches!(
            spar.simulate_interest(f64::NAN),
            Err(BankError::Validation(_))
        ));
    }

    #[test]
    fn test_simulation_on_checking_rejected() {
        let mut giro = Account::checking("Tom", 500.0, 200.0).unwrap();
        assert!(matches!(
            giro.simulate_interest(5.0),
            Err(BankError::DomainRule(_))
        ));
    }

    #[test]
    fn test_display_summaries() {
        let giro = Account::checking("Tom", 500.0, 200.0).unwrap();
        let spar = Account::savings("Jim", 1000.0, 2.0).unwrap();
        assert_eq!(
            giro.to_string(),
            "Checking: Tom | Balance: 500.00 EUR | Overdraft: 200.00 EUR"
        );
        assert_eq!(
            spar.to_string(),
            "Savings: Jim | Balance: 1000.00 EUR | Rate: 2.00%"
        );
    }
}
