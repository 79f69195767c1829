// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use tracing::debug;

use crate::context::ResourceContext;
use crate::identity::Identity;
use crate::role::RoleName;
use crate::scope::{ScopeRef, ScopedRole};
use crate::timestamp::Timestamp;

/// Roles in effect for an identity while acting on one resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectiveRoles {
    global: BTreeSet<RoleName>,
    scoped: BTreeSet<RoleName>,
    scope: Option<ScopeRef>,
}

impl EffectiveRoles {
    /// Role set holding nothing, which denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Roles held everywhere.
    pub fn global(&self) -> &BTreeSet<RoleName> {
        &self.global
    }

    /// Roles held through an active membership in the resource's owning scope.
    pub fn scoped(&self) -> &BTreeSet<RoleName> {
        &self.scoped
    }

    /// Owning scope the scoped roles were resolved for.
    pub fn scope(&self) -> Option<&ScopeRef> {
        self.scope.as_ref()
    }

    /// All distinct role names in effect, in a stable order.
    pub fn names(&self) -> impl Iterator<Item = &RoleName> {
        self.global.union(&self.scoped)
    }

    pub fn contains(&self, role: &RoleName) -> bool {
        self.global.contains(role) || self.scoped.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.scoped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names().count()
    }

    /// All roles tagged with the scope they were resolved from.
    pub fn scoped_roles(&self) -> Vec<ScopedRole> {
        let global = self.global.iter().cloned().map(ScopedRole::Global);
        let scoped = self.scope.iter().flat_map(|scope| {
            self.scoped
                .iter()
                .map(move |role| ScopedRole::scoped(scope.clone(), role.clone()))
        });
        global.chain(scoped).collect()
    }
}

/// Resolves the roles an identity holds for a given resource context.
///
/// Global roles are always in effect. When the context is owned by a project or program, roles
/// from the identity's membership in that scope are added as long as the membership is neither
/// soft-deleted nor past its `inactive_at` time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopedRoleResolver;

impl ScopedRoleResolver {
    /// Resolve roles at the current system time.
    pub fn resolve(identity: &Identity, context: &ResourceContext) -> EffectiveRoles {
        Self::resolve_at(identity, context, Timestamp::now())
    }

    /// Resolve roles with memberships checked against the given time.
    pub fn resolve_at(
        identity: &Identity,
        context: &ResourceContext,
        now: Timestamp,
    ) -> EffectiveRoles {
        let mut roles = EffectiveRoles {
            global: identity.global_roles.clone(),
            scoped: BTreeSet::new(),
            scope: context.scope.clone(),
        };

        let Some(scope) = &context.scope else {
            return roles;
        };

        if let Some(membership) = identity.membership(scope) {
            if membership.is_active_at(now) {
                roles.scoped.extend(membership.roles.iter().cloned());
            } else {
                debug!(
                    user = %identity.user_id,
                    scope = %scope,
                    inactive_at = ?membership.inactive_at,
                    deleted = membership.deleted,
                    "skip inactive membership"
                );
            }
        }

        roles
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{EffectiveRoles, ScopedRoleResolver};
    use crate::context::ResourceContext;
    use crate::identity::{Identity, Membership};
    use crate::role::RoleName;
    use crate::scope::{ScopeRef, ScopedRole};
    use crate::timestamp::Timestamp;

    const NOW: Timestamp = Timestamp::new(5_000_000_000);

    fn project_context() -> ResourceContext {
        ResourceContext::new().with_scope(ScopeRef::project("p1"))
    }

    #[test]
    fn global_roles_always_apply() {
        let identity = Identity::new("alice").with_global_role("Administrator");

        let roles = ScopedRoleResolver::resolve_at(&identity, &ResourceContext::new(), NOW);
        assert!(roles.contains(&RoleName::from("Administrator")));
        assert!(roles.scoped().is_empty());

        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        assert!(roles.contains(&RoleName::from("Administrator")));
    }

    #[test]
    fn membership_roles_only_within_their_scope() {
        let identity = Identity::new("alice")
            .with_global_role("Marketing")
            .with_membership(ScopeRef::project("p1"), Membership::new(["ProjectManager"]));

        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&RoleName::from("ProjectManager")));

        let other = ResourceContext::new().with_scope(ScopeRef::project("p2"));
        let roles = ScopedRoleResolver::resolve_at(&identity, &other, NOW);
        assert_eq!(roles.len(), 1);
        assert!(!roles.contains(&RoleName::from("ProjectManager")));
    }

    #[test]
    fn project_membership_does_not_apply_to_program_with_same_id() {
        let identity = Identity::new("alice")
            .with_membership(ScopeRef::project("x"), Membership::new(["ProjectManager"]));

        let program = ResourceContext::new().with_scope(ScopeRef::program("x"));
        let roles = ScopedRoleResolver::resolve_at(&identity, &program, NOW);
        assert!(roles.is_empty());

        let project = ResourceContext::new().with_scope(ScopeRef::project("x"));
        let roles = ScopedRoleResolver::resolve_at(&identity, &project, NOW);
        assert!(roles.contains(&RoleName::from("ProjectManager")));
    }

    #[test]
    fn membership_expiry_is_time_aware() {
        let identity = Identity::new("alice").with_membership(
            ScopeRef::project("p1"),
            Membership::new(["ProjectManager"]).inactive_at(NOW.after(Duration::from_secs(60))),
        );

        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        assert!(roles.contains(&RoleName::from("ProjectManager")));

        // Same identity two minutes later: the membership has run out.
        let later = NOW.after(Duration::from_secs(120));
        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), later);
        assert!(roles.is_empty());
    }

    #[test]
    fn no_roles_resolves_to_empty_set() {
        let identity = Identity::new("nobody");
        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        assert!(roles.is_empty());
        assert_eq!(roles.names().count(), 0);
        assert_eq!(EffectiveRoles::empty().len(), 0);
    }

    #[test]
    fn scoped_roles_are_tagged() {
        let identity = Identity::new("alice")
            .with_global_role("Administrator")
            .with_membership(ScopeRef::project("p1"), Membership::new(["Consultant"]));

        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        let tagged: Vec<String> = roles.scoped_roles().iter().map(ScopedRole::to_string).collect();
        assert_eq!(
            tagged,
            vec!["global:Administrator", "project:p1:Consultant"]
        );
    }

    #[test]
    fn role_held_globally_and_scoped_is_counted_once() {
        let identity = Identity::new("alice")
            .with_global_role("Consultant")
            .with_membership(ScopeRef::project("p1"), Membership::new(["Consultant"]));

        let roles = ScopedRoleResolver::resolve_at(&identity, &project_context(), NOW);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles.scoped_roles().len(), 2);
    }
}
