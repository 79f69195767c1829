// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use crate::condition::{Condition, ConditionInput};
use crate::context::{ResourceContext, VariantRef};
use crate::grant::{Grant, GrantTarget};
use crate::identity::{Identity, Membership};
use crate::permission::{Action, Permission};
use crate::privileges::Privileges;
use crate::registry::Registry;
use crate::resource::ResourceType;
use crate::role::define_role;
use crate::scope::ScopeRef;
use crate::sensitivity::Sensitivity;
use crate::test_utils::{
    CONSULTANT, FIELD_PARTNER, MARKETING, PROJECT_MANAGER, administrator, consultant,
    demo_privileges, field_partner, marketing, project, project_manager, setup_logging,
    step_progress,
};
use crate::timestamp::Timestamp;

const NOW: Timestamp = Timestamp::new(1_700_000_000_000_000);

#[test]
fn administrator_has_full_access_regardless_of_sensitivity() {
    setup_logging();

    let privileges = demo_privileges();
    let admin = administrator("ada");

    let project =
        privileges.for_resource_at(&admin, "Project", project("p1", Sensitivity::Medium), NOW);
    assert!(project.can(Action::Read, Some("name")));
    assert!(project.can(Action::Edit, Some("name")));
    assert!(project.can_create());
}

#[rstest]
#[case(Sensitivity::Low, true)]
#[case(Sensitivity::Medium, false)]
#[case(Sensitivity::High, false)]
fn marketing_reads_only_low_sensitivity_projects(
    #[case] sensitivity: Sensitivity,
    #[case] can_read: bool,
) {
    let privileges = demo_privileges();
    let identity = marketing("mia");

    let project = privileges.for_resource_at(&identity, "Project", project("p1", sensitivity), NOW);
    assert_eq!(project.can_read("name"), can_read);
    assert!(!project.can_edit("name"));

    // Listing is not gated by sensitivity.
    assert!(project.can_list());
}

#[test]
fn creator_condition_distinguishes_identities_with_same_role() {
    let privileges = demo_privileges();
    let carla = consultant("carla");
    let conrad = consultant("conrad");

    let product = ResourceContext::new()
        .with_id("prod1")
        .created_by("carla")
        .inherit_from(&project("p1", Sensitivity::Medium));

    let own = privileges.for_resource_at(&carla, "DirectScriptureProduct", product.clone(), NOW);
    assert!(own.can_edit("describeCompletion"));

    let other = privileges.for_resource_at(&conrad, "DirectScriptureProduct", product, NOW);
    assert!(!other.can_edit("describeCompletion"));
    assert!(other.can_read("describeCompletion"));
}

#[test]
fn for_context_reevaluates_variant_bound_grants() {
    setup_logging();

    let privileges = demo_privileges();
    let partner = field_partner("fiona", "p1");

    let progress =
        privileges.for_resource_at(&partner, "StepProgress", step_progress("p1", "partner"), NOW);
    assert!(progress.can_edit("completed"));

    let official = progress.for_context(step_progress("p1", "official"));
    assert!(!official.can_edit("completed"));
    assert!(official.can_read("completed"));
    assert_eq!(official.roles(), progress.roles());

    // The responsible role of the official variant gets the opposite result.
    let manager = project_manager("pat", "p1");
    let progress =
        privileges.for_resource_at(&manager, "StepProgress", step_progress("p1", "official"), NOW);
    assert!(progress.can_edit("completed"));
    assert!(!progress.for_context(step_progress("p1", "partner")).can_edit("completed"));
}

/// Every permission of `both` is the union of the permissions of `a` and `b`.
fn assert_union(
    privileges: &Privileges,
    [a, b, both]: [&Identity; 3],
    resource: &str,
    context: &ResourceContext,
) {
    let a = privileges.for_resource_at(a, resource, context.clone(), NOW);
    let b = privileges.for_resource_at(b, resource, context.clone(), NOW);
    let union = privileges.for_resource_at(both, resource, context.clone(), NOW);

    assert_eq!(union.can_list(), a.can_list() || b.can_list());
    assert_eq!(union.can_create(), a.can_create() || b.can_create());

    for (property, permission) in union.properties() {
        let target = GrantTarget::property(property.name.as_str());
        assert_eq!(
            permission,
            a.permission(&target) | b.permission(&target),
            "{resource}.{}",
            property.name
        );
    }
}

#[rstest]
#[case(Sensitivity::Low)]
#[case(Sensitivity::Medium)]
#[case(Sensitivity::High)]
fn holding_more_roles_only_widens_access(#[case] sensitivity: Sensitivity) {
    let privileges = demo_privileges();
    let context = project("p1", sensitivity);

    let marketing = marketing("sam");
    let manager = project_manager("sam", "p1");
    let both = Identity::new("sam")
        .with_global_role(MARKETING)
        .with_membership(ScopeRef::project("p1"), Membership::new([PROJECT_MANAGER]));

    for resource in ["Project", "Language"] {
        assert_union(&privileges, [&marketing, &manager, &both], resource, &context);
    }
}

#[rstest]
#[case("partner")]
#[case("official")]
fn variant_and_scope_grants_stay_with_their_role(#[case] variant: &str) {
    let privileges = demo_privileges();

    let partner = field_partner("sam", "p1");
    let manager = project_manager("sam", "p1");
    let both = Identity::new("sam").with_membership(
        ScopeRef::project("p1"),
        Membership::new([FIELD_PARTNER, PROJECT_MANAGER]),
    );
    let identities = [&partner, &manager, &both];

    assert_union(&privileges, identities, "StepProgress", &step_progress("p1", variant));
    assert_union(&privileges, identities, "Project", &project("p1", Sensitivity::Low));
}

#[test]
fn responsible_role_does_not_unlock_grants_of_other_roles() {
    let registry = Registry::builder()
        .resource(ResourceType::concrete("StepProgress").properties(["step", "completed"]))
        .role(define_role(
            CONSULTANT,
            [
                Grant::edit("StepProgress", "completed").with_condition(Condition::variant()),
                Grant::edit("StepProgress", "step").with_condition(Condition::scope()),
            ],
        ))
        .role(define_role(
            FIELD_PARTNER,
            [Grant::read("StepProgress", "completed")],
        ))
        .build()
        .unwrap();
    let privileges = Privileges::new(registry);

    let context = ResourceContext::new()
        .with_sensitivity(Sensitivity::Low)
        .with_scope(ScopeRef::project("p1"))
        .with_variant(VariantRef::new("partner", FIELD_PARTNER));

    let consultant = consultant("sam");
    let partner = field_partner("sam", "p1");
    let both = Identity::new("sam")
        .with_global_role(CONSULTANT)
        .with_membership(ScopeRef::project("p1"), Membership::new([FIELD_PARTNER]));

    assert_union(&privileges, [&consultant, &partner, &both], "StepProgress", &context);

    let union = privileges.for_resource_at(&both, "StepProgress", context, NOW);
    assert!(union.can_read("completed"));
    assert!(!union.can_edit("completed"));
    assert!(!union.can_read("step"));
}

#[test]
fn sensitivity_gate_takes_precedence_over_conditions() {
    fn always(_input: &ConditionInput<'_>) -> bool {
        true
    }

    let registry = Registry::builder()
        .resource(ResourceType::concrete("Project").property("name"))
        .role(define_role(
            "Reviewer",
            [Grant::edit("Project", "name")
                .with_sensitivity_access(Sensitivity::Medium)
                .with_condition(Condition::custom("Always", always))
                .with_condition(Condition::creator())],
        ))
        .build()
        .unwrap();
    let privileges = Privileges::new(registry);
    let reviewer = Identity::new("rita").with_global_role("Reviewer");

    let medium = ResourceContext::new()
        .created_by("rita")
        .with_sensitivity(Sensitivity::Medium);
    let project = privileges.for_resource_at(&reviewer, "Project", medium, NOW);
    assert!(project.can_edit("name"));

    let high = ResourceContext::new()
        .created_by("rita")
        .with_sensitivity(Sensitivity::High);
    let project = project.for_context(high);
    assert_eq!(
        project.permission(&GrantTarget::property("name")),
        Permission::NONE
    );
}

#[test]
fn specific_type_grants_shadow_parent_grants() {
    let privileges = demo_privileges();
    let carla = consultant("carla");
    let product = ResourceContext::new().inherit_from(&project("p1", Sensitivity::Low));

    // `Producible.name` grants edit, `DirectScriptureProduct.name` only read and wins.
    let privileges_on_product =
        privileges.for_resource_at(&carla, "DirectScriptureProduct", product.clone(), NOW);
    assert_eq!(
        privileges_on_product.permission(&GrantTarget::property("name")),
        Permission::read()
    );

    // Properties without a specific grant fall back to the parent's.
    assert!(privileges_on_product.can_read("mediums"));
    assert!(!privileges_on_product.can_edit("mediums"));

    // Shadowing applies within one role, other roles still add their grants.
    let admin_consultant = consultant("carla").with_global_role("Administrator");
    let privileges_on_product =
        privileges.for_resource_at(&admin_consultant, "DirectScriptureProduct", product, NOW);
    assert!(privileges_on_product.can_edit("name"));
}

#[test]
fn identity_without_roles_is_denied_everything() {
    let privileges = demo_privileges();
    let nobody = Identity::new("nobody");
    let registry = privileges.registry().snapshot();

    for resource in registry.resources().filter(|resource| !resource.is_abstract()) {
        let denied = privileges.for_resource_at(
            &nobody,
            resource.name().as_str(),
            project("p1", Sensitivity::Low),
            NOW,
        );

        assert!(denied.roles().is_empty());
        assert!(!denied.can_list());
        assert!(!denied.can_create());
        for property in resource.properties() {
            assert!(!denied.can(Action::Read, Some(property.name.as_str())));
            assert!(!denied.can(Action::Edit, Some(property.name.as_str())));
        }
        assert!(denied.readable_properties().is_empty());
    }
}

#[test]
fn redacted_properties_keep_their_shape() {
    let privileges = demo_privileges();
    let identity = marketing("mia");
    let raw = json!({
        "name": "Tok Pisin",
        "displayName": "Tok Pisin (PNG)",
        "ethnologue": "tpi",
        "locations": ["PNG"],
    });
    let raw = raw.as_object().unwrap();

    let language = ResourceContext::new().with_sensitivity(Sensitivity::Medium);
    let view = privileges
        .for_resource_at(&identity, "Language", language, NOW)
        .secure(raw);

    assert_eq!(
        serde_json::to_value(&view).unwrap(),
        json!({
            "name": { "value": null, "canRead": false, "canEdit": false },
            "displayName": { "value": null, "canRead": false, "canEdit": false },
            "ethnologue": { "value": null, "canRead": false, "canEdit": false },
            "locations": { "items": [], "canRead": false, "canCreate": false },
        })
    );

    let admin = administrator("ada");
    let language = ResourceContext::new().with_sensitivity(Sensitivity::High);
    let view = privileges
        .for_resource_at(&admin, "Language", language, NOW)
        .secure(raw);
    assert_eq!(view.items("locations"), &[json!("PNG")]);
    assert!(view.get("locations").unwrap().can_edit());
    assert_eq!(view.value("ethnologue"), Some(&json!("tpi")));
}

#[rstest]
#[case(Sensitivity::Low, true)]
#[case(Sensitivity::Medium, false)]
fn sensitivity_condition_lifts_explicit_denial(
    #[case] sensitivity: Sensitivity,
    #[case] can_read: bool,
) {
    let privileges = demo_privileges();
    let identity = marketing("mia");
    let language = ResourceContext::new().with_sensitivity(sensitivity);

    let language = privileges.for_resource_at(&identity, "Language", language, NOW);
    assert_eq!(language.can_read("ethnologue"), can_read);
}

#[test]
fn scope_condition_requires_membership_in_owning_project() {
    let privileges = demo_privileges();

    let manager = project_manager("pat", "p1");
    let own =
        privileges.for_resource_at(&manager, "Project", project("p1", Sensitivity::High), NOW);
    assert!(own.can_edit("name"));
    assert!(own.can_edit("otherLocations"));
    assert!(!own.can_read("departmentId"));

    let foreign =
        privileges.for_resource_at(&manager, "Project", project("p2", Sensitivity::Low), NOW);
    assert!(!foreign.can_edit("name"));

    // Holding the role globally does not satisfy the scope condition.
    let global = Identity::new("gil").with_global_role(PROJECT_MANAGER);
    let project =
        privileges.for_resource_at(&global, "Project", project("p1", Sensitivity::Low), NOW);
    assert!(project.can_list());
    assert!(!project.can_edit("name"));
}

#[test]
fn expired_membership_revokes_scoped_roles() {
    let privileges = demo_privileges();
    let membership =
        Membership::new([PROJECT_MANAGER]).inactive_at(NOW.after(Duration::from_secs(3600)));
    let manager = Identity::new("pat").with_membership(ScopeRef::project("p1"), membership);

    let context = project("p1", Sensitivity::Low);
    let before = privileges.for_resource_at(&manager, "Project", context.clone(), NOW);
    assert!(before.can_edit("name"));

    let after = privileges.for_resource_at(
        &manager,
        "Project",
        context,
        NOW.after(Duration::from_secs(7200)),
    );
    assert!(!after.can_list());
    assert!(!after.can_edit("name"));
}

#[test]
fn inherited_grants_apply_to_concrete_subtypes() {
    let privileges = demo_privileges();
    let manager = project_manager("pat", "p1");
    let engagement = ResourceContext::new().inherit_from(&project("p1", Sensitivity::Medium));

    let engagement = privileges.for_resource_at(&manager, "LanguageEngagement", engagement, NOW);
    assert_eq!(engagement.editable_properties(), vec!["status"]);
    assert_eq!(engagement.readable_properties(), vec!["status", "startDate"]);
    assert!(!engagement.can_list());
}

#[test]
fn request_scoped_privileges_match_direct_evaluation() {
    let privileges = demo_privileges();
    let manager = project_manager("pat", "p1");
    let mut request = privileges.request_at(&manager, NOW);

    for _ in 0..3 {
        let cached = request.for_resource("Project", project("p1", Sensitivity::Low));
        assert!(cached.can_edit("name"));
    }
    let other = request.for_resource("Project", project("p2", Sensitivity::Low));
    assert!(!other.can_edit("name"));
    assert_eq!(request.cached(), 2);
}

#[test]
fn policy_documents_drive_the_engine() {
    let registry = crate::config::load_registry(
        r#"{
            "resources": [{ "name": "Project", "properties": ["name"] }],
            "roles": [{
                "name": "ProjectManager",
                "grants": [
                    { "resource": "Project", "read": true },
                    { "resource": "Project", "property": "name", "edit": true, "read": true,
                      "conditions": ["scope"] }
                ]
            }]
        }"#,
    )
    .unwrap();
    let privileges = Privileges::new(registry);
    let manager = project_manager("pat", "p1");

    let own = privileges.for_resource_at(&manager, "Project", project("p1", Sensitivity::Low), NOW);
    assert!(own.can_list());
    assert!(own.can_edit("name"));
    assert!(own.verify_can(Action::Edit, Some("name")).is_ok());

    let foreign =
        privileges.for_resource_at(&manager, "Project", project("p2", Sensitivity::Low), NOW);
    let err = foreign.verify_can(Action::Edit, Some("name")).unwrap_err();
    assert_eq!(err.to_string(), "pat is not allowed to edit name of Project");
}
