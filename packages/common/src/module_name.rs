//! Qualified module names (`owner/name` or `owner-name`).
//!
//! Both separators are accepted on input; the canonical form uses `/`.
//! Owner and name segments must match `[a-z][a-z0-9_]*`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BadNameError {
    #[error("Module name '{0}' contains characters outside [a-z0-9_]")]
    BadCharacters(String),

    #[error("Module name '{0}' is not on the form owner/name")]
    BadSyntax(String),
}

/// A validated `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName {
    owner: String,
    name: String,
}

impl ModuleName {
    pub fn parse(input: &str) -> Result<Self, BadNameError> {
        let sep = input
            .find(|c| c == '/' || c == '-')
            .ok_or_else(|| BadNameError::BadSyntax(input.to_string()))?;

        let owner = &input[..sep];
        let name = &input[sep + 1..];
        if owner.is_empty() || name.is_empty() || name.contains(['/', '-']) {
            return Err(BadNameError::BadSyntax(input.to_string()));
        }
        for segment in [owner, name] {
            let mut chars = segment.chars();
            let first = chars.next().ok_or_else(|| BadNameError::BadSyntax(input.to_string()))?;
            if !first.is_ascii_lowercase() {
                return Err(BadNameError::BadCharacters(input.to_string()));
            }
            if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
                return Err(BadNameError::BadCharacters(input.to_string()));
            }
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for ModuleName {
    type Err = BadNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleName {
    type Error = BadNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ModuleName> for String {
    fn from(m: ModuleName) -> Self {
        m.to_string()
    }
}
