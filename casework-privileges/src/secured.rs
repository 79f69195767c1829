// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redacted views of resources, carrying permission flags next to every value.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::permission::Permission;
use crate::resource::PropertyDef;

/// A scalar property as exposed to API clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuredValue {
    /// `None` whenever `can_read` is `false`.
    pub value: Option<Value>,
    pub can_read: bool,
    pub can_edit: bool,
}

/// A list relation as exposed to API clients.
///
/// Redacted lists are empty rather than `null`. Use `can_read` to tell an empty list apart from
/// a hidden one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuredList {
    pub items: Vec<Value>,
    pub can_read: bool,
    pub can_create: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SecuredProperty {
    Value(SecuredValue),
    List(SecuredList),
}

impl SecuredProperty {
    /// Project a raw value through the given permission.
    pub fn project(property: &PropertyDef, raw: Option<&Value>, permission: Permission) -> Self {
        if property.is_list() {
            let items = match raw {
                Some(_) if !permission.can_read => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => Vec::new(),
                Some(item) => vec![item.clone()],
            };

            SecuredProperty::List(SecuredList {
                items,
                can_read: permission.can_read,
                can_create: permission.can_edit,
            })
        } else {
            let value = if permission.can_read {
                raw.filter(|value| !value.is_null()).cloned()
            } else {
                None
            };

            SecuredProperty::Value(SecuredValue {
                value,
                can_read: permission.can_read,
                can_edit: permission.can_edit,
            })
        }
    }

    pub fn can_read(&self) -> bool {
        match self {
            SecuredProperty::Value(value) => value.can_read,
            SecuredProperty::List(list) => list.can_read,
        }
    }

    /// `can_edit` for scalars, `can_create` for lists.
    pub fn can_edit(&self) -> bool {
        match self {
            SecuredProperty::Value(value) => value.can_edit,
            SecuredProperty::List(list) => list.can_create,
        }
    }

    pub fn as_value(&self) -> Option<&SecuredValue> {
        match self {
            SecuredProperty::Value(value) => Some(value),
            SecuredProperty::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&SecuredList> {
        match self {
            SecuredProperty::Value(_) => None,
            SecuredProperty::List(list) => Some(list),
        }
    }
}

/// Every declared property of one resource instance, redacted for one identity.
///
/// Properties of the raw object which are not declared on the resource type are dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SecuredView {
    properties: BTreeMap<String, SecuredProperty>,
}

impl SecuredView {
    pub(crate) fn from_properties<'a, I>(properties: I, raw: &Map<String, Value>) -> Self
    where
        I: IntoIterator<Item = (&'a PropertyDef, Permission)>,
    {
        let properties = properties
            .into_iter()
            .map(|(property, permission)| {
                let raw = raw.get(&property.name);
                let secured = SecuredProperty::project(property, raw, permission);
                (property.name.clone(), secured)
            })
            .collect();

        Self { properties }
    }

    pub fn get(&self, property: &str) -> Option<&SecuredProperty> {
        self.properties.get(property)
    }

    /// Scalar value of a property, `None` if it is redacted, empty or not a scalar.
    pub fn value(&self, property: &str) -> Option<&Value> {
        self.get(property)
            .and_then(SecuredProperty::as_value)
            .and_then(|secured| secured.value.as_ref())
    }

    /// Items of a list property, empty if it is redacted or not a list.
    pub fn items(&self, property: &str) -> &[Value] {
        self.get(property)
            .and_then(SecuredProperty::as_list)
            .map(|list| list.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecuredProperty)> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let properties = self
            .properties
            .iter()
            .map(|(name, property)| {
                let value = match property {
                    SecuredProperty::Value(value) => serde_json::json!({
                        "value": value.value,
                        "canRead": value.can_read,
                        "canEdit": value.can_edit,
                    }),
                    SecuredProperty::List(list) => serde_json::json!({
                        "items": list.items,
                        "canRead": list.can_read,
                        "canCreate": list.can_create,
                    }),
                };
                (name.clone(), value)
            })
            .collect();

        Value::Object(properties)
    }
}

#[derive(Debug, Error)]
pub enum SecureError {
    #[error("could not serialize raw resource: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("raw resource does not serialize into an object with named properties")]
    NotAnObject,
}
