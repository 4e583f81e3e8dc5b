//! Owner and engineer identities attached to commits and tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing an identity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The name part was empty.
    #[error("identity name cannot be empty")]
    EmptyName,

    /// An opening `<` without a matching closing `>`.
    #[error("malformed identity {0:?}: expected \"Name <email>\"")]
    Malformed(String),
}

/// A person attributed in history: owner (author/tagger) or engineer (committer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Contact address. Falls back to the name when none is given.
    pub email: String,
}

impl Identity {
    /// Build an identity whose email mirrors its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            email: name.clone(),
            name,
        }
    }

    /// Build an identity with an explicit email.
    pub fn with_email(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    /// Accepts `"Name <email>"` or a bare `"Name"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (name, email) = match s.find('<') {
            Some(open) => {
                let rest = &s[open + 1..];
                let close = rest
                    .find('>')
                    .ok_or_else(|| IdentityError::Malformed(s.to_string()))?;
                if !rest[close + 1..].trim().is_empty() {
                    return Err(IdentityError::Malformed(s.to_string()));
                }
                (s[..open].trim(), Some(rest[..close].trim()))
            }
            None => (s, None),
        };

        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }

        Ok(match email {
            Some(email) if !email.is_empty() => Identity::with_email(name, email),
            _ => Identity::new(name),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.email == self.name {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}
