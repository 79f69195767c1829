// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scopes in which roles can be held.
//!
//! Roles are either held globally (from the user's profile) or only while acting within a
//! specific project or program (from a membership record). Both forms can be written as a tagged
//! string: `global:<Role>` or `<scopeKind>:<scopeId>:<Role>`.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::RoleName;

/// Kind of resource which owns a membership scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Project,
    Program,
}

impl Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScopeKind::Project => "project",
            ScopeKind::Program => "program",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for ScopeKind {
    type Err = ScopedRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "project" => Ok(ScopeKind::Project),
            "program" => Ok(ScopeKind::Program),
            _ => Err(ScopedRoleError::UnknownScopeKind(value.to_string())),
        }
    }
}

/// Identifier of a project or program.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reference to the project or program owning a resource.
///
/// Serialized as `<kind>:<id>` so it can key maps in JSON documents.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScopeRef {
    pub kind: ScopeKind,
    pub id: ScopeId,
}

impl ScopeRef {
    pub fn new(kind: ScopeKind, id: impl Into<ScopeId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn project(id: impl Into<ScopeId>) -> Self {
        Self::new(ScopeKind::Project, id)
    }

    pub fn program(id: impl Into<ScopeId>) -> Self {
        Self::new(ScopeKind::Program, id)
    }
}

impl Display for ScopeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ScopeRef {
    type Err = ScopedRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split(':').collect::<Vec<_>>().as_slice() {
            [kind, id] if !kind.is_empty() && !id.is_empty() => {
                Ok(ScopeRef::new(kind.parse()?, *id))
            }
            _ => Err(ScopedRoleError::Malformed(value.to_string())),
        }
    }
}

impl From<ScopeRef> for String {
    fn from(scope: ScopeRef) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for ScopeRef {
    type Error = ScopedRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A role tagged with the scope in which it applies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScopedRole {
    /// Role held everywhere.
    Global(RoleName),

    /// Role held only while acting within the given project or program.
    Scoped { scope: ScopeRef, role: RoleName },
}

impl ScopedRole {
    pub fn global(role: impl Into<RoleName>) -> Self {
        Self::Global(role.into())
    }

    pub fn scoped(scope: ScopeRef, role: impl Into<RoleName>) -> Self {
        Self::Scoped {
            scope,
            role: role.into(),
        }
    }

    /// Name of the role, regardless of its scope.
    pub fn role(&self) -> &RoleName {
        match self {
            ScopedRole::Global(role) => role,
            ScopedRole::Scoped { role, .. } => role,
        }
    }

    /// Scope of the role, `None` for global roles.
    pub fn scope(&self) -> Option<&ScopeRef> {
        match self {
            ScopedRole::Global(_) => None,
            ScopedRole::Scoped { scope, .. } => Some(scope),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, ScopedRole::Global(_))
    }
}

impl Display for ScopedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopedRole::Global(role) => write!(f, "global:{}", role),
            ScopedRole::Scoped { scope, role } => write!(f, "{}:{}", scope, role),
        }
    }
}

impl FromStr for ScopedRole {
    type Err = ScopedRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ScopedRoleError::Malformed(value.to_string()));
        }

        match parts.as_slice() {
            ["global", role] => Ok(ScopedRole::global(*role)),
            [kind, id, role] => {
                let kind = kind.parse::<ScopeKind>()?;
                Ok(ScopedRole::scoped(ScopeRef::new(kind, *id), *role))
            }
            _ => Err(ScopedRoleError::Malformed(value.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopedRoleError {
    #[error("malformed scope '{0}', expected 'global:<Role>', '<kind>:<id>' or '<kind>:<id>:<Role>'")]
    Malformed(String),

    #[error("unknown scope kind '{0}'")]
    UnknownScopeKind(String),
}
