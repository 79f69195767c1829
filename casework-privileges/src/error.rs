// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::grant::GrantTarget;
use crate::identity::UserId;
use crate::permission::Action;
use crate::resource::ResourceName;
use crate::role::RoleName;

/// Invalid role or resource declarations, detected while building a registry at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("resource type {0} is declared more than once")]
    DuplicateResource(ResourceName),

    #[error("property {property} is declared more than once on resource type {resource}")]
    DuplicateProperty {
        resource: ResourceName,
        property: String,
    },

    #[error("role {0} is declared more than once")]
    DuplicateRole(RoleName),

    #[error("resource type {resource} extends unknown type {parent}")]
    UnknownParent {
        resource: ResourceName,
        parent: ResourceName,
    },

    #[error("resource type {resource} extends {parent} which is not abstract")]
    ConcreteParent {
        resource: ResourceName,
        parent: ResourceName,
    },

    #[error("resource type {0} inherits from itself")]
    InheritanceCycle(ResourceName),

    #[error("role {role} grants access to unknown resource type {resource}")]
    UnknownResource {
        role: RoleName,
        resource: ResourceName,
    },

    #[error("role {role} grants access to unknown property {property} of resource type {resource}")]
    UnknownProperty {
        role: RoleName,
        resource: ResourceName,
        property: String,
    },
}

/// A `verify_can` check failed.
///
/// The message names the denied action and property only, it never reveals whether the
/// underlying data exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{user} is not allowed to {action} {target} of {resource}")]
pub struct Unauthorized {
    pub user: UserId,
    pub resource: ResourceName,
    pub action: Action,
    pub target: GrantTarget,
}

impl Unauthorized {
    /// Error code the API layer reports to clients.
    pub fn code(&self) -> &'static str {
        "Unauthorized"
    }
}
