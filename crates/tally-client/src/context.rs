//! # Session Context
//!
//! The credential for the signed-in cashier, passed explicitly to every
//! backend call. Token storage and refresh live outside this crate.

use std::fmt;

use crate::error::{ClientError, ClientResult};

/// Bearer credential for one POS session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: String,
}

impl SessionContext {
    /// Wraps a bearer token. Blank tokens are refused.
    pub fn new(token: impl Into<String>) -> ClientResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ClientError::MissingToken);
        }
        Ok(SessionContext { token })
    }

    /// Reads the token from an environment variable.
    pub fn from_env(var: &str) -> ClientResult<Self> {
        let token = std::env::var(var).map_err(|_| ClientError::MissingToken)?;
        Self::new(token)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Never print the token itself.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .finish()
    }
}
