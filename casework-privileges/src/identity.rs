// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::role::RoleName;
use crate::scope::ScopeRef;
use crate::timestamp::Timestamp;

/// Identifier of a user.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Roles a user holds within one project or program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub roles: BTreeSet<RoleName>,

    /// When the membership stops granting roles. `None` means it never expires.
    pub inactive_at: Option<Timestamp>,

    /// Soft-deleted memberships never grant roles.
    #[serde(default)]
    pub deleted: bool,
}

impl Membership {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            inactive_at: None,
            deleted: false,
        }
    }

    /// Set the time after which this membership is no longer active.
    pub fn inactive_at(mut self, timestamp: Timestamp) -> Self {
        self.inactive_at = Some(timestamp);
        self
    }

    /// Mark this membership as soft-deleted.
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Returns `true` if the membership grants its roles at the given time.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        if self.deleted {
            return false;
        }

        match self.inactive_at {
            Some(inactive_at) => inactive_at > now,
            None => true,
        }
    }
}

/// The requesting user together with all role data needed to evaluate privileges.
///
/// Memberships are expected to be pre-fetched by the caller; the engine never looks them up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub global_roles: BTreeSet<RoleName>,
    pub memberships: HashMap<ScopeRef, Membership>,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            global_roles: BTreeSet::new(),
            memberships: HashMap::new(),
        }
    }

    /// Add a role held everywhere.
    pub fn with_global_role(mut self, role: impl Into<RoleName>) -> Self {
        self.global_roles.insert(role.into());
        self
    }

    /// Add the membership record for a project or program.
    pub fn with_membership(mut self, scope: ScopeRef, membership: Membership) -> Self {
        self.memberships.insert(scope, membership);
        self
    }

    pub fn membership(&self, scope: &ScopeRef) -> Option<&Membership> {
        self.memberships.get(scope)
    }
}
