// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attribute-based access control for case-management resources.
//!
//! Roles declare grants on resource types and their properties, gated by data sensitivity and
//! conditions over the requesting identity and the resource instance. [`Privileges`] merges them
//! into a [`UserResourcePrivileges`] decision which answers `can` questions and redacts resources
//! into a [`SecuredView`].
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod grant;
pub mod hierarchy;
pub mod identity;
pub mod permission;
pub mod privileges;
pub mod registry;
pub mod resolver;
pub mod resource;
pub mod role;
pub mod scope;
pub mod secured;
pub mod sensitivity;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
#[cfg(test)]
mod tests;
pub mod timestamp;

pub use condition::{Condition, ConditionInput, Predicate};
pub use config::{ConfigLoadError, EngineConfig, PolicyConfig, load_registry};
pub use context::{ResourceContext, VariantRef};
pub use error::{ConfigError, Unauthorized};
pub use grant::{Grant, GrantTarget};
pub use identity::{Identity, Membership, UserId};
pub use permission::{Action, Permission};
pub use privileges::{Privileges, RequestPrivileges, UserResourcePrivileges};
pub use registry::{Registry, RegistryBuilder, SharedRegistry};
pub use resolver::{EffectiveRoles, ScopedRoleResolver};
pub use resource::{PropertyDef, PropertyKind, ResourceName, ResourceType};
pub use role::{Role, RoleName, define_role};
pub use scope::{ScopeId, ScopeKind, ScopeRef, ScopedRole};
pub use secured::{SecureError, SecuredList, SecuredProperty, SecuredValue, SecuredView};
pub use sensitivity::Sensitivity;
pub use timestamp::Timestamp;
