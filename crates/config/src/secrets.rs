// Planning-service password lookup
//
// Passwords come from:
// 1. The environment variable named by `[epm] password_env`
// 2. System keychain (service "slicecheck", account "epm/<username>")
//
// Passwords are NEVER stored in config.toml

use std::env;

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "slicecheck";

/// Source of a password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Keychain,
    None,
}

impl SecretSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretSource::Environment => "environment",
            SecretSource::Keychain => "keychain",
            SecretSource::None => "none",
        }
    }
}

/// Result of password lookup
#[derive(Debug, Clone)]
pub struct SecretLookup {
    pub secret: Option<String>,
    pub source: SecretSource,
}

#[cfg(feature = "keychain")]
fn keychain_account(username: &str) -> String {
    format!("epm/{}", username)
}

/// Find the planning-service password for `username`.
pub fn get_password(password_env: &str, username: &str) -> SecretLookup {
    if let Ok(secret) = env::var(password_env) {
        if !secret.is_empty() {
            return SecretLookup {
                secret: Some(secret),
                source: SecretSource::Environment,
            };
        }
    }

    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(username)) {
            if let Ok(secret) = entry.get_password() {
                return SecretLookup {
                    secret: Some(secret),
                    source: SecretSource::Keychain,
                };
            }
        }
    }
    #[cfg(not(feature = "keychain"))]
    let _ = username;

    SecretLookup {
        secret: None,
        source: SecretSource::None,
    }
}
