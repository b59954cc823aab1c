//! Module identities and live module handles
//!
//! An [`Identity`] names a module independently of whether it is open; a
//! [`ModuleHandle`] names one live, open module in the workspace. Two
//! different handles may carry the same identity (an identity collision).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while parsing an identity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Empty identity")]
    Empty,

    #[error("Invalid identity '{value}': expected group:artifact[:version]")]
    InvalidFormat { value: String },

    #[error("Invalid identity '{value}': {part} must not be empty")]
    EmptyPart { value: String, part: &'static str },
}

/// Value-equal key naming a module: `group:artifact[:version]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    group: String,
    artifact: String,
    version: Option<String>,
}

impl Identity {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.artifact, version),
            None => write!(f, "{}:{}", self.group, self.artifact),
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [group, artifact] => (*group, *artifact, None),
            [group, artifact, version] => (*group, *artifact, Some(*version)),
            _ => {
                return Err(IdentityError::InvalidFormat {
                    value: trimmed.to_string(),
                });
            }
        };

        for (part, name) in [(group, "group"), (artifact, "artifact")] {
            if part.is_empty() {
                return Err(IdentityError::EmptyPart {
                    value: trimmed.to_string(),
                    part: name,
                });
            }
        }
        if version == Some("") {
            return Err(IdentityError::EmptyPart {
                value: trimmed.to_string(),
                part: "version",
            });
        }

        let identity = Identity::new(group, artifact);
        Ok(match version {
            Some(version) => identity.with_version(version),
            None => identity,
        })
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.to_string()
    }
}

/// Opaque reference to one live module in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleHandle(Arc<str>);

impl ModuleHandle {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleHandle {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}
