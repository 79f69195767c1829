// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging grants into per-property permissions for one identity and resource instance.
//!
//! For every property of a resource type (and for the resource itself) the engine collects the
//! grants of all roles in effect, walking the type chain most specific first. Within one role the
//! nearest type declaring grants for a property decides, parent grants are shadowed. Grants are
//! then dropped by the sensitivity gate or a failing condition and the remaining permission bits
//! are OR-ed together across roles.
//!
//! ```
//! use casework_privileges::{
//!     Grant, Identity, Privileges, Registry, ResourceContext, ResourceType, Sensitivity,
//!     define_role,
//! };
//!
//! let registry = Registry::builder()
//!     .resource(ResourceType::concrete("Project").properties(["name", "budget"]))
//!     .role(define_role(
//!         "Marketing",
//!         [Grant::read("Project", "name").with_sensitivity_access(Sensitivity::Low)],
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let privileges = Privileges::new(registry);
//! let identity = Identity::new("alice").with_global_role("Marketing");
//!
//! let low = ResourceContext::new().with_sensitivity(Sensitivity::Low);
//! let project = privileges.for_resource(&identity, "Project", low);
//! assert!(project.can_read("name"));
//! assert!(!project.can_read("budget"));
//!
//! let medium = ResourceContext::new().with_sensitivity(Sensitivity::Medium);
//! assert!(!project.for_context(medium).can_read("name"));
//! ```
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::condition::ConditionInput;
use crate::config::EngineConfig;
use crate::context::ResourceContext;
use crate::error::Unauthorized;
use crate::grant::{Grant, GrantTarget};
use crate::identity::Identity;
use crate::permission::{Action, Permission};
use crate::registry::{Registry, SharedRegistry};
use crate::resolver::{EffectiveRoles, ScopedRoleResolver};
use crate::resource::{PropertyDef, ResourceName};
use crate::role::RoleName;
use crate::secured::{SecureError, SecuredView};
use crate::sensitivity::Sensitivity;
use crate::timestamp::Timestamp;

/// Entry point computing privileges of identities on resources.
///
/// Cheap to clone, all clones evaluate against the same (swappable) registry.
#[derive(Clone, Debug)]
pub struct Privileges {
    registry: SharedRegistry,
    config: EngineConfig,
}

impl Privileges {
    pub fn new(registry: impl Into<SharedRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: impl Into<SharedRegistry>, config: EngineConfig) -> Self {
        Self {
            registry: registry.into(),
            config,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Privileges of `identity` on an instance of `resource`, with memberships checked against
    /// the current system time.
    pub fn for_resource<'a>(
        &self,
        identity: &'a Identity,
        resource: &str,
        context: ResourceContext,
    ) -> UserResourcePrivileges<'a> {
        self.for_resource_at(identity, resource, context, Timestamp::now())
    }

    pub fn for_resource_at<'a>(
        &self,
        identity: &'a Identity,
        resource: &str,
        context: ResourceContext,
        now: Timestamp,
    ) -> UserResourcePrivileges<'a> {
        let roles = ScopedRoleResolver::resolve_at(identity, &context, now);
        UserResourcePrivileges::compute(
            self.registry.snapshot(),
            self.config,
            identity,
            resource.into(),
            Arc::new(roles),
            context,
            now,
        )
    }

    /// Start evaluating privileges for one logical operation of `identity`.
    pub fn request<'a>(&'a self, identity: &'a Identity) -> RequestPrivileges<'a> {
        self.request_at(identity, Timestamp::now())
    }

    pub fn request_at<'a>(
        &'a self,
        identity: &'a Identity,
        now: Timestamp,
    ) -> RequestPrivileges<'a> {
        RequestPrivileges {
            privileges: self,
            identity,
            registry: self.registry.snapshot(),
            now,
            cache: HashMap::new(),
        }
    }
}

/// Merged permissions of every target of one resource type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PermissionTable {
    resource: Permission,
    properties: HashMap<String, Permission>,
}

impl PermissionTable {
    fn get(&self, target: &GrantTarget) -> Permission {
        match target {
            GrantTarget::Resource => self.resource,
            GrantTarget::Property(name) => self.property(name),
        }
    }

    fn property(&self, name: &str) -> Permission {
        self.properties.get(name).copied().unwrap_or(Permission::NONE)
    }
}

/// Decision object holding what one identity may do with one resource instance.
///
/// All permissions are computed on construction, lookups afterwards are plain table reads.
/// Properties which are not declared on the resource type are never readable nor editable.
#[derive(Clone, Debug)]
pub struct UserResourcePrivileges<'a> {
    registry: Arc<Registry>,
    config: EngineConfig,
    identity: &'a Identity,
    resource: ResourceName,
    roles: Arc<EffectiveRoles>,
    context: ResourceContext,
    now: Timestamp,
    table: Arc<PermissionTable>,
}

impl<'a> UserResourcePrivileges<'a> {
    fn compute(
        registry: Arc<Registry>,
        config: EngineConfig,
        identity: &'a Identity,
        resource: ResourceName,
        roles: Arc<EffectiveRoles>,
        context: ResourceContext,
        now: Timestamp,
    ) -> Self {
        let mut privileges = Self {
            registry,
            config,
            identity,
            resource,
            roles,
            context,
            now,
            table: Arc::default(),
        };
        privileges.table = Arc::new(privileges.merge_all());
        privileges
    }

    fn merge_all(&self) -> PermissionTable {
        let Some(resource) = self.registry.resource(self.resource.as_str()) else {
            warn!(
                resource = %self.resource,
                user = %self.identity.user_id,
                "privileges requested for unknown resource type"
            );
            return PermissionTable::default();
        };

        let chain = resource.type_chain();
        let table = PermissionTable {
            resource: self.merge(chain, &GrantTarget::Resource),
            properties: resource
                .properties()
                .iter()
                .map(|property| {
                    let target = GrantTarget::property(property.name.as_str());
                    (property.name.clone(), self.merge(chain, &target))
                })
                .collect(),
        };

        debug!(
            resource = %self.resource,
            user = %self.identity.user_id,
            roles = self.roles.len(),
            sensitivity = %self.sensitivity(),
            "computed privileges"
        );

        table
    }

    /// OR of all surviving grants of all roles for one target.
    fn merge(&self, chain: &[ResourceName], target: &GrantTarget) -> Permission {
        let sensitivity = self.sensitivity();
        let mut permission = Permission::NONE;

        for role in self.roles.names() {
            let Some((entry, grants)) = nearest_grants(&self.registry, role, chain, target) else {
                continue;
            };

            let input = ConditionInput {
                identity: self.identity,
                context: &self.context,
                role,
                roles: &self.roles,
                now: self.now,
            };

            for grant in grants {
                if !grant.admits(sensitivity) {
                    trace!(
                        %role,
                        resource = %entry,
                        %target,
                        %sensitivity,
                        "grant dropped by sensitivity gate"
                    );
                    continue;
                }

                if let Some(condition) = grant.failing_condition(&input) {
                    trace!(
                        %role,
                        resource = %entry,
                        %target,
                        %condition,
                        "grant dropped by failing condition"
                    );
                    continue;
                }

                permission |= grant.permission;
            }
        }

        permission
    }

    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    pub fn identity(&self) -> &'a Identity {
        self.identity
    }

    pub fn roles(&self) -> &EffectiveRoles {
        &self.roles
    }

    pub fn context(&self) -> &ResourceContext {
        &self.context
    }

    /// Sensitivity the grant-level gate is evaluated at.
    pub fn sensitivity(&self) -> Sensitivity {
        self.context
            .effective_sensitivity()
            .unwrap_or(self.config.missing_sensitivity)
    }

    /// Merged permission for the resource itself or one of its properties.
    pub fn permission(&self, target: &GrantTarget) -> Permission {
        self.table.get(target)
    }

    /// Returns `true` if the action is allowed on the given property, or on the resource itself
    /// when no property is given (listing for `Read`, creating for `Edit`).
    pub fn can(&self, action: Action, property: Option<&str>) -> bool {
        let permission = match property {
            Some(name) => self.table.property(name),
            None => self.table.resource,
        };
        permission.allows(action)
    }

    pub fn can_read(&self, property: &str) -> bool {
        self.can(Action::Read, Some(property))
    }

    pub fn can_edit(&self, property: &str) -> bool {
        self.can(Action::Edit, Some(property))
    }

    pub fn can_list(&self) -> bool {
        self.can(Action::Read, None)
    }

    pub fn can_create(&self) -> bool {
        self.can(Action::Edit, None)
    }

    /// Like [`can`](Self::can), but fails with [`Unauthorized`] if the action is not allowed.
    pub fn verify_can(&self, action: Action, property: Option<&str>) -> Result<(), Unauthorized> {
        if self.can(action, property) {
            return Ok(());
        }

        let target = GrantTarget::from_property(property);
        debug!(
            user = %self.identity.user_id,
            resource = %self.resource,
            %action,
            %target,
            "denied"
        );

        Err(Unauthorized {
            user: self.identity.user_id.clone(),
            resource: self.resource.clone(),
            action,
            target,
        })
    }

    /// Declared properties of the resource type with their merged permissions.
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyDef, Permission)> {
        self.registry
            .resource(self.resource.as_str())
            .map(|resource| resource.properties())
            .unwrap_or(&[])
            .iter()
            .map(|property| (property, self.table.property(&property.name)))
    }

    pub fn readable_properties(&self) -> Vec<&str> {
        self.properties()
            .filter(|(_, permission)| permission.can_read)
            .map(|(property, _)| property.name.as_str())
            .collect()
    }

    pub fn editable_properties(&self) -> Vec<&str> {
        self.properties()
            .filter(|(_, permission)| permission.can_edit)
            .map(|(property, _)| property.name.as_str())
            .collect()
    }

    /// Redact a raw resource, keyed by property name.
    pub fn secure(&self, raw: &Map<String, Value>) -> SecuredView {
        SecuredView::from_properties(self.properties(), raw)
    }

    /// Redact any serializable resource whose fields are named like the declared properties.
    pub fn secure_dto<T: Serialize>(&self, dto: &T) -> Result<SecuredView, SecureError> {
        match serde_json::to_value(dto)? {
            Value::Object(raw) => Ok(self.secure(&raw)),
            _ => Err(SecureError::NotAnObject),
        }
    }

    /// Re-evaluate the already resolved roles against another instance of the same type.
    ///
    /// Roles are not resolved again, so memberships of the new context's scope are not looked up.
    pub fn for_context(&self, context: ResourceContext) -> UserResourcePrivileges<'a> {
        UserResourcePrivileges::compute(
            self.registry.clone(),
            self.config,
            self.identity,
            self.resource.clone(),
            self.roles.clone(),
            context,
            self.now,
        )
    }
}

/// Nearest type chain entry for which the role declares grants on the target.
fn nearest_grants<'r>(
    registry: &'r Registry,
    role: &RoleName,
    chain: &'r [ResourceName],
    target: &GrantTarget,
) -> Option<(&'r ResourceName, &'r [Grant])> {
    chain
        .iter()
        .map(|entry| (entry, registry.grants(role, entry, target)))
        .find(|(_, grants)| !grants.is_empty())
}

/// Privileges of one identity during one logical operation, for example a single API request.
///
/// Computed privileges are kept per resource type and context, so resolving many fields of the
/// same instance only merges grants once. The registry snapshot and evaluation time are fixed
/// when the request starts. Never keep this around longer than the operation itself, roles and
/// memberships may change between requests.
#[derive(Debug)]
pub struct RequestPrivileges<'a> {
    privileges: &'a Privileges,
    identity: &'a Identity,
    registry: Arc<Registry>,
    now: Timestamp,
    cache: HashMap<(ResourceName, ResourceContext), UserResourcePrivileges<'a>>,
}

impl<'a> RequestPrivileges<'a> {
    pub fn identity(&self) -> &'a Identity {
        self.identity
    }

    pub fn for_resource(
        &mut self,
        resource: &str,
        context: ResourceContext,
    ) -> UserResourcePrivileges<'a> {
        if !self.privileges.config.memoize {
            return self.compute(resource.into(), context);
        }

        let key = (ResourceName::from(resource), context);
        if let Some(cached) = self.cache.get(&key) {
            trace!(
                resource = %key.0,
                context = key.1.fingerprint(),
                "reuse privileges computed earlier in request"
            );
            return cached.clone();
        }

        let privileges = self.compute(key.0.clone(), key.1.clone());
        self.cache.insert(key, privileges.clone());
        privileges
    }

    /// Number of distinct resource instances evaluated so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compute(
        &self,
        resource: ResourceName,
        context: ResourceContext,
    ) -> UserResourcePrivileges<'a> {
        let roles = ScopedRoleResolver::resolve_at(self.identity, &context, self.now);
        UserResourcePrivileges::compute(
            self.registry.clone(),
            self.privileges.config,
            self.identity,
            resource,
            Arc::new(roles),
            context,
            self.now,
        )
    }
}
