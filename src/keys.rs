//! # Job keys.
//!
//! A [`JobKey`] is the immutable (role, environment, name) triple identifying
//! a recurring job in the cluster. Its canonical string form is
//! `role/environment/name`, and it is guaranteed that
//! `JobKey::parse(&key.to_string()) == Ok(key)`.
//!
//! Each component must be a *good identifier*: non-empty, at most
//! [`MAX_IDENTIFIER_LEN`] bytes, limited to ASCII alphanumerics plus `_`,
//! `-` and `.`. The slash can therefore never appear inside a component,
//! which is what makes the canonical form unambiguous.
//!
//! ## Example
//! ```rust
//! use cronvisor::JobKey;
//!
//! let key = JobKey::new("ads", "prod", "hourly-rollup").unwrap();
//! assert_eq!(key.to_string(), "ads/prod/hourly-rollup");
//! assert_eq!(JobKey::parse("ads/prod/hourly-rollup").unwrap(), key);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Maximum byte length of a single key component.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Identifier of a recurring job: (role, environment, name).
///
/// Construction always validates, so a `JobKey` in hand is known good.
/// `Display` renders the canonical `role/environment/name` form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobKey {
    role: String,
    environment: String,
    name: String,
}

impl JobKey {
    /// Builds a key from its components, validating each one.
    pub fn new(
        role: impl Into<String>,
        environment: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let role = check_identifier("role", role.into())?;
        let environment = check_identifier("environment", environment.into())?;
        let name = check_identifier("name", name.into())?;
        Ok(Self {
            role,
            environment,
            name,
        })
    }

    /// Parses the canonical `role/environment/name` form.
    ///
    /// Exact inverse of `Display`: `parse(&k.to_string()) == Ok(k)`.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(role), Some(environment), Some(name), None) => {
                Self::new(role, environment, name)
            }
            _ => Err(KeyError::BadFormat(s.to_string())),
        }
    }

    /// The role owning the job.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// The environment the job runs in.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The job's name within its role and environment.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.role, self.environment, self.name)
    }
}

impl TryFrom<String> for JobKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, KeyError> {
        Self::parse(&s)
    }
}

impl From<JobKey> for String {
    fn from(key: JobKey) -> String {
        key.to_string()
    }
}

fn check_identifier(component: &'static str, value: String) -> Result<String, KeyError> {
    let ok = !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if ok {
        Ok(value)
    } else {
        Err(KeyError::BadIdentifier { component, value })
    }
}
