// 🔐 Auth capability - verified identities with roles
//
// The domain only ever sees a verified `Identity`; how the token was minted
// is the transport's business. `TokenAuthProvider` signs
// `username:role:expiry` with SHA-256 over a shared secret - deliberately
// small, the same shape an external JWT verifier would return.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::BankError;

/// Token lifetime in minutes.
pub const TOKEN_LIFETIME_MINUTES: i64 = 30;

// ============================================================================
// ROLES & IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access: account creation and interest crediting included
    Admin,
    /// Transactions only (deposit/withdraw)
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }

    fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// A caller whose token has already been verified.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

// ============================================================================
// AUTH PROVIDER
// ============================================================================

/// Capability consumed by the transport: turn a bearer token into a verified
/// identity, or fail with an auth error.
pub trait AuthProvider: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<Identity, BankError>;
}

/// Signed-token provider. Token layout: `username:role:expiry_unix:signature`
/// where the signature is the hex SHA-256 digest of the secret plus payload.
pub struct TokenAuthProvider {
    secret: String,
}

impl TokenAuthProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        TokenAuthProvider {
            secret: secret.into(),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(payload.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Issue a token for an authenticated user.
    pub fn issue_token(&self, username: &str, role: Role) -> String {
        let expiry = (Utc::now() + chrono::Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp();
        let payload = format!("{username}:{}:{expiry}", role.as_str());
        let signature = self.sign(&payload);
        tracing::info!(user = username, role = role.as_str(), "token issued");
        format!("{payload}:{signature}")
    }
}

impl AuthProvider for TokenAuthProvider {
    fn verify_token(&self, token: &str) -> Result<Identity, BankError> {
        let invalid = || BankError::Auth("token could not be validated or has expired".to_string());

        // Usernames may contain ':', so split from the right
        let mut parts = token.rsplitn(4, ':');
        let signature = parts.next().ok_or_else(invalid)?;
        let expiry = parts.next().ok_or_else(invalid)?;
        let role = parts.next().ok_or_else(invalid)?;
        let username = parts.next().filter(|u| !u.is_empty()).ok_or_else(invalid)?;

        let payload = format!("{username}:{role}:{expiry}");
        if self.sign(&payload) != signature {
            tracing::warn!("token rejected: bad signature");
            return Err(invalid());
        }

        let expiry: i64 = expiry.parse().map_err(|_| invalid())?;
        if Utc::now().timestamp() >= expiry {
            tracing::warn!(user = username, "token rejected: expired");
            return Err(invalid());
        }

        let role = Role::parse(role).ok_or_else(invalid)?;
        Ok(Identity {
            username: username.to_string(),
            role,
        })
    }
}

// ============================================================================
// USER TABLE
// ============================================================================

/// Static login table backing the /login endpoint: the admin plus one demo
/// viewer, passwords held as SHA-256 digests.
pub struct UserTable {
    users: Vec<UserEntry>,
}

struct UserEntry {
    username: String,
    password_sha256: String,
    role: Role,
}

impl UserTable {
    pub fn from_config(config: &Config) -> Self {
        UserTable {
            users: vec![
                UserEntry {
                    username: "admin".to_string(),
                    password_sha256: sha256_hex(&config.admin_password),
                    role: Role::Admin,
                },
                UserEntry {
                    username: "DEMO_USER".to_string(),
                    password_sha256: sha256_hex(&config.demo_password),
                    role: Role::Viewer,
                },
            ],
        }
    }

    /// Check credentials; returns the canonical username and role on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<(&str, Role)> {
        let digest = sha256_hex(password);
        self.users
            .iter()
            .find(|u| u.username == username && u.password_sha256 == digest)
            .map(|u| (u.username.as_str(), u.role))
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let provider = TokenAuthProvider::new("test_secret");
        let token = provider.issue_token("admin", Role::Admin);

        let identity = provider.verify_token(&token).unwrap();
        assert_eq!(identity.username, "admin");
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let provider = TokenAuthProvider::new("test_secret");
        let token = provider.issue_token("DEMO_USER", Role::Viewer);

        // Promote viewer to admin without re-signing
        let forged = token.replacen("viewer", "admin", 1);
        assert!(matches!(
            provider.verify_token(&forged),
            Err(BankError::Auth(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let provider = TokenAuthProvider::new("secret_a");
        let token = provider.issue_token("admin", Role::Admin);

        let other = TokenAuthProvider::new("secret_b");
        assert!(matches!(other.verify_token(&token), Err(BankError::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let provider = TokenAuthProvider::new("test_secret");

        // Hand-build a token whose expiry is in the past
        let expiry = Utc::now().timestamp() - 60;
        let payload = format!("admin:admin:{expiry}");
        let token = format!("{payload}:{}", provider.sign(&payload));

        assert!(matches!(
            provider.verify_token(&token),
            Err(BankError::Auth(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let provider = TokenAuthProvider::new("test_secret");
        assert!(provider.verify_token("not-a-token").is_err());
        assert!(provider.verify_token("").is_err());
        assert!(provider.verify_token(":::").is_err());
    }

    #[test]
    fn test_username_with_colon_round_trips() {
        let provider = TokenAuthProvider::new("test_secret");
        let token = provider.issue_token("o:dd", Role::Viewer);
        let identity = provider.verify_token(&token).unwrap();
        assert_eq!(identity.username, "o:dd");
    }

    #[test]
    fn test_user_table_authentication() {
        let mut config = crate::config::Config::from_env();
        config.admin_password = "letmein".to_string();
        config.demo_password = "demo123".to_string();
        let users = UserTable::from_config(&config);

        let (name, role) = users.authenticate("admin", "letmein").unwrap();
        assert_eq!(name, "admin");
        assert_eq!(role, Role::Admin);

        assert!(users.authenticate("admin", "wrong").is_none());
        assert!(users.authenticate("nobody", "letmein").is_none());

        let (_, role) = users.authenticate("DEMO_USER", "demo123").unwrap();
        assert_eq!(role, Role::Viewer);
    }
}
