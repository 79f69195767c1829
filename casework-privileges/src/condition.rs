// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conditions qualifying whether a grant applies to a specific resource instance.
//!
//! Conditions are pure predicates over the requesting identity and the instance context. They
//! never fail: whenever a field a condition depends on was not resolved, the condition is simply
//! not met.
use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::context::ResourceContext;
use crate::identity::Identity;
use crate::resolver::EffectiveRoles;
use crate::role::RoleName;
use crate::sensitivity::Sensitivity;
use crate::timestamp::Timestamp;

/// Everything a condition can inspect.
#[derive(Clone, Copy, Debug)]
pub struct ConditionInput<'a> {
    pub identity: &'a Identity,
    pub context: &'a ResourceContext,

    /// Role the evaluated grant was declared under.
    pub role: &'a RoleName,

    /// All roles in effect for the identity.
    pub roles: &'a EffectiveRoles,

    /// Time memberships are checked against.
    pub now: Timestamp,
}

/// Interface for custom, application-defined predicates.
pub trait Predicate: Send + Sync {
    fn evaluate(&self, input: &ConditionInput<'_>) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&ConditionInput<'_>) -> bool + Send + Sync,
{
    fn evaluate(&self, input: &ConditionInput<'_>) -> bool {
        self(input)
    }
}

/// Named custom predicate.
#[derive(Clone)]
pub struct CustomCondition {
    name: String,
    predicate: Arc<dyn Predicate>,
}

impl CustomCondition {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for CustomCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCondition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomCondition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// The identity created the resource.
    Creator,

    /// The identity holds the grant's role through an active membership in the project or
    /// program owning the resource.
    Scope,

    /// The resource is at most as sensitive as the given threshold.
    Sensitivity(Sensitivity),

    /// The variant bound to the resource is the responsibility of the grant's role.
    Variant,

    /// All inner conditions hold.
    All(Vec<Condition>),

    Custom(CustomCondition),
}

impl Condition {
    pub fn creator() -> Self {
        Condition::Creator
    }

    pub fn scope() -> Self {
        Condition::Scope
    }

    pub fn sensitivity(threshold: Sensitivity) -> Self {
        Condition::Sensitivity(threshold)
    }

    pub fn variant() -> Self {
        Condition::Variant
    }

    pub fn all<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = Condition>,
    {
        Condition::All(conditions.into_iter().collect())
    }

    pub fn custom(name: impl Into<String>, predicate: impl Predicate + 'static) -> Self {
        Condition::Custom(CustomCondition {
            name: name.into(),
            predicate: Arc::new(predicate),
        })
    }

    /// Combine this condition with another one, both need to hold.
    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::All(mut conditions) => {
                conditions.push(other);
                Condition::All(conditions)
            }
            condition => Condition::All(vec![condition, other]),
        }
    }

    pub fn evaluate(&self, input: &ConditionInput<'_>) -> bool {
        match self {
            Condition::Creator => has_creator(input),
            Condition::Scope => has_scope(input),
            Condition::Sensitivity(threshold) => has_sensitivity(input, *threshold),
            Condition::Variant => has_variant(input),
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(input)),
            Condition::Custom(custom) => custom.predicate.evaluate(input),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Creator => write!(f, "HasCreator"),
            Condition::Scope => write!(f, "HasScope"),
            Condition::Sensitivity(threshold) => write!(f, "HasSensitivity({})", threshold),
            Condition::Variant => write!(f, "HasVariant"),
            Condition::All(conditions) => {
                let names: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "All({})", names.join(", "))
            }
            Condition::Custom(custom) => write!(f, "{}", custom.name),
        }
    }
}

fn has_creator(input: &ConditionInput<'_>) -> bool {
    input
        .context
        .created_by
        .as_ref()
        .is_some_and(|creator| creator == &input.identity.user_id)
}

fn has_scope(input: &ConditionInput<'_>) -> bool {
    let Some(scope) = &input.context.scope else {
        return false;
    };

    input
        .identity
        .membership(scope)
        .is_some_and(|membership| {
            membership.is_active_at(input.now) && membership.roles.contains(input.role)
        })
}

fn has_sensitivity(input: &ConditionInput<'_>, threshold: Sensitivity) -> bool {
    input
        .context
        .effective_sensitivity()
        .is_some_and(|sensitivity| sensitivity.at_most(threshold))
}

fn has_variant(input: &ConditionInput<'_>) -> bool {
    input
        .context
        .variant
        .as_ref()
        .and_then(|variant| variant.responsible_role.as_ref())
        .is_some_and(|responsible| responsible == input.role)
}
