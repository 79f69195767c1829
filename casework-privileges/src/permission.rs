// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Actions which can be checked against a property or a whole resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read a property, or list the resource when no property is given.
    Read,

    /// Edit a property, or create the resource when no property is given.
    Edit,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Read => "read",
            Action::Edit => "edit",
        };

        write!(f, "{}", s)
    }
}

/// Read and edit bits for a single property.
///
/// Permissions from multiple grants are combined with a logical OR, never an AND: holding more
/// roles can only ever widen access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub can_read: bool,
    pub can_edit: bool,
}

impl Permission {
    /// No access at all.
    pub const NONE: Permission = Permission {
        can_read: false,
        can_edit: false,
    };

    pub fn new(can_read: bool, can_edit: bool) -> Self {
        Self { can_read, can_edit }
    }

    /// Read-only access.
    pub fn read() -> Self {
        Self::new(true, false)
    }

    /// Read and edit access.
    pub fn edit() -> Self {
        Self::new(true, true)
    }

    /// Returns `true` if the given action is allowed.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.can_read,
            Action::Edit => self.can_edit,
        }
    }

    /// Returns `true` if neither reading nor editing is allowed.
    pub fn is_none(&self) -> bool {
        !self.can_read && !self.can_edit
    }

    /// Logical OR of both permissions.
    pub fn union(self, other: Permission) -> Permission {
        Permission {
            can_read: self.can_read || other.can_read,
            can_edit: self.can_edit || other.can_edit,
        }
    }
}

impl BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        self.union(rhs)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Permission) {
        *self = self.union(rhs);
    }
}
