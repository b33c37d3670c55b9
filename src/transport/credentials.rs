//! Collector credentials.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identity presented to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
}

/// Handshake payload: `{"user":{"username":..},"token":..|null}`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub user: User,
    pub token: Option<String>,
}

impl Credentials {
    /// Build credentials, deriving the token when a secret is configured.
    pub fn new(username: impl Into<String>, secret: Option<&str>) -> Self {
        Self {
            user: User {
                username: username.into(),
            },
            token: secret.map(derive_token),
        }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// Never print the token.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.user.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// base64(SHA-256(secret)).
pub fn derive_token(secret: &str) -> String {
    STANDARD.encode(Sha256::digest(secret.as_bytes()))
}
