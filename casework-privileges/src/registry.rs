// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide catalog of resource types and the roles granting access to them.
//!
//! A [`Registry`] is built once at startup from declarative resource and role definitions and
//! validated eagerly: any grant referencing an unknown type or property fails the build. Once
//! built the registry is read-only and can be shared between threads without locking.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::grant::{Grant, GrantTarget};
use crate::hierarchy::TypeHierarchy;
use crate::resource::{PropertyDef, ResourceName, ResourceType};
use crate::role::{Role, RoleName};

/// Resource type with its inheritance chain and all (own and inherited) properties resolved.
#[derive(Clone, Debug)]
pub struct ResolvedResource {
    descriptor: ResourceType,
    chain: Vec<ResourceName>,
    properties: Vec<PropertyDef>,
}

impl ResolvedResource {
    pub fn name(&self) -> &ResourceName {
        &self.descriptor.name
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor.is_abstract
    }

    /// The type itself followed by its ancestors, most specific first.
    pub fn type_chain(&self) -> &[ResourceName] {
        &self.chain
    }

    /// Declared and inherited properties, own properties first.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn has_target(&self, target: &GrantTarget) -> bool {
        match target {
            GrantTarget::Resource => true,
            GrantTarget::Property(name) => self.property(name).is_some(),
        }
    }
}

type GrantIndex = HashMap<ResourceName, HashMap<GrantTarget, Vec<Grant>>>;

/// Validated, read-only set of resource types and roles.
#[derive(Debug)]
pub struct Registry {
    resources: HashMap<ResourceName, ResolvedResource>,
    hierarchy: TypeHierarchy,
    roles: BTreeMap<RoleName, Role>,
    grants: HashMap<RoleName, GrantIndex>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn resource(&self, name: &str) -> Option<&ResolvedResource> {
        self.resources.get(name)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResolvedResource> {
        self.resources.values()
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// The type itself followed by its ancestors, empty for unknown types.
    pub fn type_chain(&self, name: &str) -> &[ResourceName] {
        self.resources
            .get(name)
            .map(ResolvedResource::type_chain)
            .unwrap_or(&[])
    }

    /// Return `true` if `name` is `ancestor` or inherits from it.
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        self.hierarchy.is_a(name, ancestor)
    }

    /// Grants a role declares for exactly this resource type and target.
    ///
    /// Grants declared for parents of `resource` are not included, walk the type chain to
    /// collect those.
    pub fn grants(
        &self,
        role: &RoleName,
        resource: &ResourceName,
        target: &GrantTarget,
    ) -> &[Grant] {
        self.grants
            .get(role)
            .and_then(|index| index.get(resource))
            .and_then(|targets| targets.get(target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Collects resource and role definitions and validates them into a [`Registry`].
///
/// Grants reference resource types by name only, so roles and resources can be added in any
/// order. Names are resolved when [`build`](Self::build) is called.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: Vec<ResourceType>,
    roles: Vec<Role>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, resource: ResourceType) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn build(self) -> Result<Registry, ConfigError> {
        let mut hierarchy = TypeHierarchy::new();
        let mut descriptors: HashMap<ResourceName, ResourceType> = HashMap::new();

        for resource in self.resources {
            if descriptors.contains_key(&resource.name) {
                return Err(ConfigError::DuplicateResource(resource.name));
            }

            let mut seen = HashSet::new();
            for property in &resource.properties {
                if !seen.insert(property.name.as_str()) {
                    return Err(ConfigError::DuplicateProperty {
                        resource: resource.name.clone(),
                        property: property.name.clone(),
                    });
                }
            }

            hierarchy.add_type(&resource.name);
            descriptors.insert(resource.name.clone(), resource);
        }

        for resource in descriptors.values() {
            for parent in &resource.parents {
                match descriptors.get(parent) {
                    None => {
                        return Err(ConfigError::UnknownParent {
                            resource: resource.name.clone(),
                            parent: parent.clone(),
                        });
                    }
                    Some(descriptor) if !descriptor.is_abstract => {
                        return Err(ConfigError::ConcreteParent {
                            resource: resource.name.clone(),
                            parent: parent.clone(),
                        });
                    }
                    Some(_) => hierarchy.add_parent(&resource.name, parent),
                }
            }
        }

        if let Some(name) = hierarchy.find_cycle() {
            return Err(ConfigError::InheritanceCycle(name));
        }

        let resources: HashMap<ResourceName, ResolvedResource> = descriptors
            .iter()
            .map(|(name, descriptor)| {
                let chain = hierarchy.type_chain(name.as_str());
                let properties = inherited_properties(&chain, &descriptors);
                let resolved = ResolvedResource {
                    descriptor: descriptor.clone(),
                    chain,
                    properties,
                };
                (name.clone(), resolved)
            })
            .collect();

        let mut roles = BTreeMap::new();
        let mut grants: HashMap<RoleName, GrantIndex> = HashMap::new();

        for role in self.roles {
            if roles.contains_key(role.name()) {
                return Err(ConfigError::DuplicateRole(role.name().clone()));
            }

            let index = grants.entry(role.name().clone()).or_default();
            for grant in role.grants() {
                let Some(resource) = resources.get(&grant.resource) else {
                    return Err(ConfigError::UnknownResource {
                        role: role.name().clone(),
                        resource: grant.resource.clone(),
                    });
                };

                if !resource.has_target(&grant.target) {
                    return Err(ConfigError::UnknownProperty {
                        role: role.name().clone(),
                        resource: grant.resource.clone(),
                        property: grant.target.to_string(),
                    });
                }

                index
                    .entry(grant.resource.clone())
                    .or_default()
                    .entry(grant.target.clone())
                    .or_default()
                    .push(grant.clone());
            }

            roles.insert(role.name().clone(), role);
        }

        debug!(
            resources = resources.len(),
            roles = roles.len(),
            "built privileges registry"
        );

        Ok(Registry {
            resources,
            hierarchy,
            roles,
            grants,
        })
    }
}

fn inherited_properties(
    chain: &[ResourceName],
    descriptors: &HashMap<ResourceName, ResourceType>,
) -> Vec<PropertyDef> {
    let mut seen = HashSet::new();
    chain
        .iter()
        .filter_map(|name| descriptors.get(name))
        .flat_map(|descriptor| descriptor.properties.iter())
        .filter(|property| seen.insert(property.name.clone()))
        .cloned()
        .collect()
}

/// Registry handle which can be swapped for a new registry at runtime.
///
/// Readers take a snapshot of the current registry and keep evaluating against it, even when a
/// replacement is swapped in concurrently. A replacement is always a fully built registry, so no
/// evaluation ever observes a partially updated rule set.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<Registry>>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// The currently active registry.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.inner.read().clone()
    }

    /// Atomically replace the active registry, returning the previous one.
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        let registry = Arc::new(registry);
        let previous = std::mem::replace(&mut *self.inner.write(), registry);
        warn!(
            roles = previous.roles.len(),
            resources = previous.resources.len(),
            "replaced privileges registry at runtime"
        );
        previous
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::{Registry, SharedRegistry};
    use crate::error::ConfigError;
    use crate::grant::{Grant, GrantTarget};
    use crate::resource::{PropertyKind, ResourceName, ResourceType};
    use crate::role::{RoleName, define_role};

    fn products() -> Vec<ResourceType> {
        vec![
            ResourceType::abstract_type("Producible").property("name"),
            ResourceType::abstract_type("Product")
                .extends("Producible")
                .properties(["describeCompletion", "mediums"]),
            ResourceType::concrete("DirectScriptureProduct")
                .extends("Product")
                .list("scriptureReferences"),
        ]
    }

    fn builder_with_products() -> super::RegistryBuilder {
        products()
            .into_iter()
            .fold(Registry::builder(), |builder, resource| builder.resource(resource))
    }

    #[test]
    fn resolves_chain_and_inherited_properties() {
        let registry = builder_with_products().build().unwrap();

        let resource = registry.resource("DirectScriptureProduct").unwrap();
        let chain: Vec<&str> = resource.type_chain().iter().map(ResourceName::as_str).collect();
        assert_eq!(chain, vec!["DirectScriptureProduct", "Product", "Producible"]);

        let properties: Vec<&str> = resource
            .properties()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(
            properties,
            vec!["scriptureReferences", "describeCompletion", "mediums", "name"]
        );
        assert_eq!(
            resource.property("scriptureReferences").map(|p| p.kind),
            Some(PropertyKind::List)
        );
        assert!(!resource.is_abstract());
        assert!(registry.is_a("DirectScriptureProduct", "Producible"));
        assert!(registry.type_chain("Unknown").is_empty());
    }

    #[test]
    fn grants_on_inherited_properties_are_valid() {
        let registry = builder_with_products()
            .role(define_role(
                "Consultant",
                [
                    Grant::read("Producible", "name"),
                    Grant::read("DirectScriptureProduct", "name"),
                    Grant::edit("Product", "describeCompletion"),
                ],
            ))
            .build()
            .unwrap();

        let role = RoleName::from("Consultant");
        let grants = registry.grants(
            &role,
            &"Product".into(),
            &GrantTarget::property("describeCompletion"),
        );
        assert_eq!(grants.len(), 1);

        // Grants are indexed by the exact type they were declared for.
        let grants = registry.grants(
            &role,
            &"DirectScriptureProduct".into(),
            &GrantTarget::property("describeCompletion"),
        );
        assert!(grants.is_empty());
        assert!(registry.role("Consultant").is_some());
    }

    #[test]
    fn rejects_unknown_resource_in_grant() {
        let result = builder_with_products()
            .role(define_role("Consultant", [Grant::read("Budget", "total")]))
            .build();

        assert_matches!(
            result,
            Err(ConfigError::UnknownResource { resource, .. }) if resource.as_str() == "Budget"
        );
    }

    #[test]
    fn rejects_unknown_property_in_grant() {
        let result = builder_with_products()
            .role(define_role(
                "Consultant",
                [Grant::read("Product", "scriptureReferences")],
            ))
            .build();

        // Properties of subtypes are not visible on their parents.
        assert_matches!(
            result,
            Err(ConfigError::UnknownProperty { property, .. }) if property == "scriptureReferences"
        );
    }

    #[test]
    fn rejects_invalid_hierarchies() {
        let result = Registry::builder()
            .resource(ResourceType::concrete("Product").extends("Producible"))
            .build();
        assert_matches!(result, Err(ConfigError::UnknownParent { .. }));

        let result = Registry::builder()
            .resource(ResourceType::concrete("Project"))
            .resource(ResourceType::concrete("TranslationProject").extends("Project"))
            .build();
        assert_matches!(result, Err(ConfigError::ConcreteParent { .. }));

        let result = Registry::builder()
            .resource(ResourceType::abstract_type("A").extends("B"))
            .resource(ResourceType::abstract_type("B").extends("A"))
            .build();
        assert_matches!(result, Err(ConfigError::InheritanceCycle(_)));
    }

    #[test]
    fn rejects_duplicates() {
        let result = Registry::builder()
            .resource(ResourceType::concrete("Project"))
            .resource(ResourceType::concrete("Project"))
            .build();
        assert_matches!(result, Err(ConfigError::DuplicateResource(_)));

        let result = Registry::builder()
            .resource(ResourceType::concrete("Project").property("name").property("name"))
            .build();
        assert_matches!(result, Err(ConfigError::DuplicateProperty { .. }));

        let result = Registry::builder()
            .resource(ResourceType::concrete("Project"))
            .role(define_role("Consultant", []))
            .role(define_role("Consultant", []))
            .build();
        assert_matches!(result, Err(ConfigError::DuplicateRole(_)));
    }

    #[test]
    fn shared_registry_swaps_atomically() {
        let shared = SharedRegistry::new(builder_with_products().build().unwrap());
        let before = shared.snapshot();
        assert!(before.resource("Product").is_some());

        let replacement = Registry::builder()
            .resource(ResourceType::concrete("Project"))
            .build()
            .unwrap();
        let previous = shared.replace(replacement);

        // Old snapshots stay intact, new ones see the replacement.
        assert!(previous.resource("Product").is_some());
        assert!(before.resource("Product").is_some());
        assert!(shared.snapshot().resource("Product").is_none());
        assert!(shared.snapshot().resource("Project").is_some());
    }
}
