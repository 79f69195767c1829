// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Borrow;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::grant::Grant;

/// Name identifying a role, for example `ProjectManager` or `Administrator`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for RoleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A named role owning a list of grants.
///
/// Roles are immutable once defined and only ever become effective through a
/// [`Registry`](crate::registry::Registry), which validates all grants at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Role {
    name: RoleName,
    grants: Vec<Grant>,
}

impl Role {
    pub fn new(name: impl Into<RoleName>, grants: Vec<Grant>) -> Self {
        Self {
            name: name.into(),
            grants,
        }
    }

    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }
}

/// Define a role with the given grants.
pub fn define_role<I>(name: impl Into<RoleName>, grants: I) -> Role
where
    I: IntoIterator<Item = Grant>,
{
    Role::new(name, grants.into_iter().collect())
}
