// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::role::RoleName;
use crate::scope::ScopeRef;
use crate::sensitivity::Sensitivity;

/// Variant bound to a resource, for example partner-submitted or office-confirmed progress.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantRef {
    pub key: String,

    /// Role responsible for filling in this variant.
    pub responsible_role: Option<RoleName>,
}

impl VariantRef {
    pub fn new(key: impl Into<String>, responsible_role: impl Into<RoleName>) -> Self {
        Self {
            key: key.into(),
            responsible_role: Some(responsible_role.into()),
        }
    }
}

/// Resolved fields of one resource instance which privileges are evaluated against.
///
/// The repository layer resolves these fields before privileges are computed. Any field left
/// empty makes conditions depending on it fail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceContext {
    pub id: Option<String>,
    pub created_by: Option<UserId>,
    pub sensitivity: Option<Sensitivity>,
    pub scope: Option<ScopeRef>,
    pub variant: Option<VariantRef>,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn created_by(mut self, user_id: impl Into<UserId>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    pub fn with_scope(mut self, scope: ScopeRef) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_variant(mut self, variant: VariantRef) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Take over the effective sensitivity and owning scope of the resource this one belongs to.
    ///
    /// A product has no sensitivity of its own, it is as sensitive as its project. When both
    /// carry a sensitivity the more sensitive one is kept.
    pub fn inherit_from(mut self, parent: &ResourceContext) -> Self {
        self.sensitivity = match (self.sensitivity, parent.sensitivity) {
            (Some(own), Some(inherited)) => Some(own.most_sensitive(inherited)),
            (own, inherited) => own.or(inherited),
        };

        if self.scope.is_none() {
            self.scope = parent.scope.clone();
        }

        self
    }

    /// Effective sensitivity, if it was resolved.
    pub fn effective_sensitivity(&self) -> Option<Sensitivity> {
        self.sensitivity
    }

    /// Stable hash of all fields, used to key per-request caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
