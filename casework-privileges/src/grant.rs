// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, ConditionInput};
use crate::permission::Permission;
use crate::resource::ResourceName;
use crate::sensitivity::Sensitivity;

/// What a grant gives access to: the resource as a whole or one of its properties.
///
/// Resource-level grants decide whether a resource can be listed (read) or created (edit).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrantTarget {
    Resource,
    Property(String),
}

impl GrantTarget {
    pub fn property(name: impl Into<String>) -> Self {
        GrantTarget::Property(name.into())
    }

    pub fn from_property(property: Option<&str>) -> Self {
        match property {
            Some(name) => GrantTarget::property(name),
            None => GrantTarget::Resource,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        match self {
            GrantTarget::Resource => None,
            GrantTarget::Property(name) => Some(name),
        }
    }
}

impl Display for GrantTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantTarget::Resource => write!(f, "<resource>"),
            GrantTarget::Property(name) => write!(f, "{}", name),
        }
    }
}

/// A declared permission rule for one resource type and property.
///
/// The grant only contributes its permission bits when the evaluated instance is not more
/// sensitive than `sensitivity_access` and all `conditions` hold.
#[derive(Clone, Debug, PartialEq)]
pub struct Grant {
    pub resource: ResourceName,
    pub target: GrantTarget,
    pub permission: Permission,
    pub sensitivity_access: Option<Sensitivity>,
    pub conditions: Vec<Condition>,
}

impl Grant {
    pub fn new(
        resource: impl Into<ResourceName>,
        target: GrantTarget,
        permission: Permission,
    ) -> Self {
        Self {
            resource: resource.into(),
            target,
            permission,
            sensitivity_access: None,
            conditions: Vec::new(),
        }
    }

    /// Read access to a property.
    pub fn read(resource: impl Into<ResourceName>, property: impl Into<String>) -> Self {
        Self::new(resource, GrantTarget::property(property), Permission::read())
    }

    /// Read and edit access to a property.
    pub fn edit(resource: impl Into<ResourceName>, property: impl Into<String>) -> Self {
        Self::new(resource, GrantTarget::property(property), Permission::edit())
    }

    /// Explicitly deny access to a property.
    ///
    /// Denying grants never take away access given by other roles, but they do shadow grants
    /// the same role declares for a parent type.
    pub fn none(resource: impl Into<ResourceName>, property: impl Into<String>) -> Self {
        Self::new(resource, GrantTarget::property(property), Permission::NONE)
    }

    /// Permission to list resources of this type.
    pub fn list(resource: impl Into<ResourceName>) -> Self {
        Self::new(resource, GrantTarget::Resource, Permission::read())
    }

    /// Permission to list and create resources of this type.
    pub fn create(resource: impl Into<ResourceName>) -> Self {
        Self::new(resource, GrantTarget::Resource, Permission::edit())
    }

    /// One grant with the same permission for each of the given properties.
    pub fn each<I, S>(
        resource: impl Into<ResourceName>,
        properties: I,
        permission: Permission,
    ) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resource = resource.into();
        properties
            .into_iter()
            .map(|property| {
                Self::new(resource.clone(), GrantTarget::property(property), permission)
            })
            .collect()
    }

    /// Only apply this grant to instances at most as sensitive as the given level.
    pub fn with_sensitivity_access(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity_access = Some(sensitivity);
        self
    }

    /// Attach a condition which needs to hold for this grant to apply.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns `true` if the sensitivity gate lets this grant apply to an instance of the given
    /// effective sensitivity.
    pub fn admits(&self, sensitivity: Sensitivity) -> bool {
        self.sensitivity_access
            .is_none_or(|threshold| sensitivity.at_most(threshold))
    }

    /// Returns the first attached condition which does not hold.
    pub fn failing_condition(&self, input: &ConditionInput<'_>) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| !condition.evaluate(input))
    }
}
