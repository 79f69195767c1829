// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative configuration of resource types, roles and engine behaviour.
//!
//! A [`PolicyConfig`] mirrors what can be declared with [`RegistryBuilder`] as plain data, so a
//! complete grant table can be shipped as a JSON document and validated at startup:
//!
//! ```json
//! {
//!   "resources": [
//!     { "name": "Project", "properties": ["name", { "name": "locations", "list": true }] }
//!   ],
//!   "roles": [
//!     {
//!       "name": "Marketing",
//!       "grants": [
//!         { "resource": "Project", "property": "name", "read": true, "sensitivity_access": "Low" }
//!       ]
//!     }
//!   ]
//! }
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::Condition;
use crate::error::ConfigError;
use crate::grant::{Grant, GrantTarget};
use crate::permission::Permission;
use crate::registry::{Registry, RegistryBuilder};
use crate::resource::{PropertyDef, ResourceType};
use crate::role::Role;
use crate::sensitivity::Sensitivity;

/// Behaviour of the privileges engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sensitivity assumed for instances whose sensitivity was not resolved.
    pub missing_sensitivity: Sensitivity,

    /// Cache computed privileges for the lifetime of one request.
    pub memoize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_sensitivity: Sensitivity::High,
            memoize: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub properties: Vec<PropertyConfig>,
}

/// A property is either given by name only (scalar) or with its shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyConfig {
    Scalar(String),
    Detailed {
        name: String,
        #[serde(default)]
        list: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,

    #[serde(default)]
    pub grants: Vec<GrantConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub resource: String,

    /// Property name, the grant targets the resource itself when omitted.
    #[serde(default)]
    pub property: Option<String>,

    #[serde(default)]
    pub read: bool,

    #[serde(default)]
    pub edit: bool,

    #[serde(default)]
    pub sensitivity_access: Option<Sensitivity>,

    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionConfig {
    Creator,
    Scope,
    Variant,
    Sensitivity(Sensitivity),
    All(Vec<ConditionConfig>),
}

impl From<ConditionConfig> for Condition {
    fn from(config: ConditionConfig) -> Self {
        match config {
            ConditionConfig::Creator => Condition::Creator,
            ConditionConfig::Scope => Condition::Scope,
            ConditionConfig::Variant => Condition::Variant,
            ConditionConfig::Sensitivity(threshold) => Condition::Sensitivity(threshold),
            ConditionConfig::All(conditions) => {
                Condition::all(conditions.into_iter().map(Condition::from))
            }
        }
    }
}

impl From<PropertyConfig> for PropertyDef {
    fn from(config: PropertyConfig) -> Self {
        match config {
            PropertyConfig::Scalar(name) => PropertyDef::scalar(name),
            PropertyConfig::Detailed { name, list: true } => PropertyDef::list(name),
            PropertyConfig::Detailed { name, list: false } => PropertyDef::scalar(name),
        }
    }
}

impl From<ResourceConfig> for ResourceType {
    fn from(config: ResourceConfig) -> Self {
        ResourceType {
            name: config.name.into(),
            is_abstract: config.is_abstract,
            parents: config.parents.into_iter().map(Into::into).collect(),
            properties: config.properties.into_iter().map(PropertyDef::from).collect(),
        }
    }
}

impl From<GrantConfig> for Grant {
    fn from(config: GrantConfig) -> Self {
        let target = match config.property {
            Some(property) => GrantTarget::Property(property),
            None => GrantTarget::Resource,
        };

        let mut grant = Grant::new(
            config.resource,
            target,
            Permission::new(config.read, config.edit),
        );
        grant.sensitivity_access = config.sensitivity_access;
        grant.conditions = config.conditions.into_iter().map(Condition::from).collect();
        grant
    }
}

impl From<RoleConfig> for Role {
    fn from(config: RoleConfig) -> Self {
        Role::new(
            config.name,
            config.grants.into_iter().map(Grant::from).collect(),
        )
    }
}

impl PolicyConfig {
    pub fn from_json(value: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(value)?)
    }

    /// Convert into a builder, to add further definitions from code.
    pub fn into_builder(self) -> RegistryBuilder {
        let builder = self
            .resources
            .into_iter()
            .fold(RegistryBuilder::new(), |builder, resource| {
                builder.resource(resource.into())
            });

        self.roles
            .into_iter()
            .fold(builder, |builder, role| builder.role(role.into()))
    }

    /// Validate all definitions and build a registry from them.
    pub fn into_registry(self) -> Result<Registry, ConfigError> {
        self.into_builder().build()
    }
}

/// Parse and validate a JSON policy document in one step.
pub fn load_registry(json: &str) -> Result<Registry, ConfigLoadError> {
    Ok(PolicyConfig::from_json(json)?.into_registry()?)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("could not parse policy document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
