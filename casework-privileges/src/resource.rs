// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Borrow;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Name of a resource type, for example `Project` or `LanguageEngagement`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Shape of a property value.
///
/// The shape decides how a property is redacted: scalars become `null`, lists become empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    #[default]
    Scalar,
    List,
}

/// A property or relation declared on a resource type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDef {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar,
        }
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::List,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind == PropertyKind::List
    }
}

/// Descriptor of a resource type.
///
/// Grants declared for an abstract type apply to every type listing it (directly or
/// transitively) as a parent. Concrete types can not be used as parents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceType {
    pub name: ResourceName,
    pub is_abstract: bool,
    pub parents: Vec<ResourceName>,
    pub properties: Vec<PropertyDef>,
}

impl ResourceType {
    /// A type which can be instantiated.
    pub fn concrete(name: impl Into<ResourceName>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            parents: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// A type which only exists to share properties and grants with its subtypes.
    pub fn abstract_type(name: impl Into<ResourceName>) -> Self {
        Self {
            is_abstract: true,
            ..Self::concrete(name)
        }
    }

    /// Inherit properties and grants from an abstract parent.
    pub fn extends(mut self, parent: impl Into<ResourceName>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Declare a scalar property.
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDef::scalar(name));
        self
    }

    /// Declare several scalar properties at once.
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .extend(names.into_iter().map(PropertyDef::scalar));
        self
    }

    /// Declare a list-valued relation.
    pub fn list(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDef::list(name));
        self
    }
}
