// SPDX-License-Identifier: MIT OR Apache-2.0

//! Demo registry modelled on a language project management domain, with identities and contexts
//! to evaluate it against.
use crate::condition::Condition;
use crate::context::{ResourceContext, VariantRef};
use crate::grant::Grant;
use crate::identity::{Identity, Membership};
use crate::permission::Permission;
use crate::privileges::Privileges;
use crate::registry::Registry;
use crate::resource::ResourceType;
use crate::role::{Role, define_role};
use crate::scope::ScopeRef;
use crate::sensitivity::Sensitivity;

pub const ADMINISTRATOR: &str = "Administrator";
pub const MARKETING: &str = "Marketing";
pub const CONSULTANT: &str = "Consultant";
pub const PROJECT_MANAGER: &str = "ProjectManager";
pub const FIELD_PARTNER: &str = "FieldPartner";

/// Install a log subscriber when `RUST_LOG` is set.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

pub fn demo_resources() -> Vec<ResourceType> {
    vec![
        ResourceType::concrete("Project")
            .properties(["name", "step", "departmentId"])
            .list("otherLocations"),
        ResourceType::concrete("Language")
            .properties(["name", "displayName", "ethnologue"])
            .list("locations"),
        ResourceType::abstract_type("Engagement").properties(["status", "startDate"]),
        ResourceType::concrete("LanguageEngagement")
            .extends("Engagement")
            .properties(["firstScripture", "paratextRegistryId"]),
        ResourceType::abstract_type("Producible").property("name"),
        ResourceType::abstract_type("Product")
            .extends("Producible")
            .properties(["describeCompletion", "mediums"]),
        ResourceType::concrete("DirectScriptureProduct")
            .extends("Product")
            .list("scriptureReferences"),
        ResourceType::concrete("ProgressReport").properties(["status", "highlights"]),
        ResourceType::concrete("StepProgress").properties(["step", "completed"]),
    ]
}

pub fn demo_roles() -> Vec<Role> {
    let full_access: [(&str, &[&str]); 6] = [
        ("Project", &["name", "step", "departmentId", "otherLocations"]),
        ("Language", &["name", "displayName", "ethnologue", "locations"]),
        (
            "LanguageEngagement",
            &["status", "startDate", "firstScripture", "paratextRegistryId"],
        ),
        (
            "DirectScriptureProduct",
            &["name", "describeCompletion", "mediums", "scriptureReferences"],
        ),
        ("ProgressReport", &["status", "highlights"]),
        ("StepProgress", &["step", "completed"]),
    ];
    let administrator = full_access.into_iter().flat_map(|(resource, properties)| {
        let mut grants = Grant::each(resource, properties.iter().copied(), Permission::edit());
        grants.push(Grant::create(resource));
        grants
    });

    let marketing = [
        Grant::list("Project"),
        Grant::list("Language"),
        Grant::read("Project", "name").with_sensitivity_access(Sensitivity::Low),
        Grant::read("Language", "name").with_sensitivity_access(Sensitivity::Low),
        Grant::read("Language", "displayName").with_sensitivity_access(Sensitivity::Low),
        // Denied in general, readable while the language is not sensitive.
        Grant::none("Language", "ethnologue"),
        Grant::read("Language", "ethnologue")
            .with_condition(Condition::sensitivity(Sensitivity::Low)),
    ];

    let consultant = [
        Grant::edit("Producible", "name"),
        Grant::read("DirectScriptureProduct", "name"),
        Grant::read("Product", "describeCompletion"),
        Grant::edit("Product", "describeCompletion").with_condition(Condition::creator()),
        Grant::read("Product", "mediums"),
        Grant::read("DirectScriptureProduct", "scriptureReferences"),
    ];

    let project_manager = [
        Grant::list("Project"),
        Grant::edit("Project", "name").with_condition(Condition::scope()),
        Grant::edit("Project", "step").with_condition(Condition::scope()),
        Grant::edit("Project", "otherLocations").with_condition(Condition::scope()),
        Grant::edit("Engagement", "status").with_condition(Condition::scope()),
        Grant::read("Engagement", "startDate"),
        Grant::read("ProgressReport", "status"),
        Grant::read("StepProgress", "completed"),
        Grant::edit("StepProgress", "completed").with_condition(Condition::variant()),
    ];

    let field_partner = [
        Grant::read("ProgressReport", "status"),
        Grant::read("StepProgress", "step"),
        Grant::read("StepProgress", "completed"),
        Grant::edit("StepProgress", "completed").with_condition(Condition::variant()),
    ];

    vec![
        define_role(ADMINISTRATOR, administrator),
        define_role(MARKETING, marketing),
        define_role(CONSULTANT, consultant),
        define_role(PROJECT_MANAGER, project_manager),
        define_role(FIELD_PARTNER, field_partner),
    ]
}

pub fn demo_registry() -> Registry {
    let builder = demo_resources()
        .into_iter()
        .fold(Registry::builder(), |builder, resource| builder.resource(resource));

    demo_roles()
        .into_iter()
        .fold(builder, |builder, role| builder.role(role))
        .build()
        .unwrap()
}

pub fn demo_privileges() -> Privileges {
    Privileges::new(demo_registry())
}

pub fn administrator(user_id: &str) -> Identity {
    Identity::new(user_id).with_global_role(ADMINISTRATOR)
}

pub fn marketing(user_id: &str) -> Identity {
    Identity::new(user_id).with_global_role(MARKETING)
}

pub fn consultant(user_id: &str) -> Identity {
    Identity::new(user_id).with_global_role(CONSULTANT)
}

pub fn project_manager(user_id: &str, project: &str) -> Identity {
    Identity::new(user_id)
        .with_membership(ScopeRef::project(project), Membership::new([PROJECT_MANAGER]))
}

pub fn field_partner(user_id: &str, project: &str) -> Identity {
    Identity::new(user_id)
        .with_membership(ScopeRef::project(project), Membership::new([FIELD_PARTNER]))
}

pub fn project(id: &str, sensitivity: Sensitivity) -> ResourceContext {
    ResourceContext::new()
        .with_id(id)
        .with_sensitivity(sensitivity)
        .with_scope(ScopeRef::project(id))
}

/// Step progress of a report in `project`, bound to one of the report's variants.
pub fn step_progress(project_id: &str, variant: &str) -> ResourceContext {
    let responsible = match variant {
        "partner" => FIELD_PARTNER,
        _ => PROJECT_MANAGER,
    };

    ResourceContext::new()
        .with_variant(VariantRef::new(variant, responsible))
        .inherit_from(&project(project_id, Sensitivity::Low))
}
