//! Signed-in user identity as reported by the host's auth provider.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Identity of a signed-in user, typically an e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Build from raw text. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Edge trigger for the one session-log load per component lifetime.
///
/// `observe` yields the user the first time a signed-in identity is
/// reported and never again, whatever the later sign-in/sign-out history.
#[derive(Debug, Default)]
pub struct IdentityGate {
    previous: Option<UserId>,
    fired: bool,
}

impl IdentityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, identity: Option<UserId>) -> Option<UserId> {
        let edge = self.previous.is_none() && identity.is_some() && !self.fired;
        self.previous = identity.clone();
        if edge {
            self.fired = true;
            identity
        } else {
            None
        }
    }

    /// Whether the load has already been issued.
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
