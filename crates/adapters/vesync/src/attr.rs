//! Dotted attribute paths over vendor device objects.
//!
//! Vendor devices expose heterogeneous, partially-populated data: some fields
//! are plain members, some live in nested `details` maps, some only exist on
//! certain models. [`resolve`] walks a path such as `details.water_tank_lifted`
//! one segment at a time and reports `None` as soon as a segment is missing,
//! so callers never have to distinguish "not this model" from "not reported".
//!
//! A [`AttrValue::Map`] is looked up by key, a [`AttrValue::Record`] by member
//! name; any other value has no members. A value that is present but
//! [`AttrValue::Null`] counts as absent.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use vesync_hub_domain::entity::AttributeValue;

/// An object whose members can be looked up by name.
pub trait Attributes: Send + Sync {
    /// Return the member called `name`, or `None` if the object has none.
    fn attr(&self, name: &str) -> Option<AttrValue>;
}

/// A value reachable from a device through an attribute path.
#[derive(Clone)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
    Record(Arc<dyn Attributes>),
}

impl AttrValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Convert into an entity attribute.
    ///
    /// Scalars map one to one, lists and maps become JSON. Records and nulls
    /// have no attribute form.
    #[must_use]
    pub fn to_attribute(&self) -> Option<AttributeValue> {
        match self {
            Self::Null | Self::Record(_) => None,
            Self::Bool(value) => Some(AttributeValue::Bool(*value)),
            Self::Int(value) => Some(AttributeValue::Int(*value)),
            Self::Float(value) => Some(AttributeValue::Float(*value)),
            Self::String(value) => Some(AttributeValue::String(value.clone())),
            Self::List(_) | Self::Map(_) => self.to_json().map(AttributeValue::Json),
        }
    }

    fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value;

        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::Float(value) => serde_json::Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::String(value) => Value::String(value.clone()),
            Self::List(items) => Value::Array(items.iter().filter_map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
                    .collect(),
            ),
            Self::Record(_) => return None,
        })
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::String(value) => f.debug_tuple("String").field(value).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Record(_) => f.write_str("Record(..)"),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Resolve a dotted `path` starting at `root`.
///
/// The empty path yields `root` itself. Returns `None` when any segment is
/// missing, when an intermediate value has no members, or when the final
/// value is [`AttrValue::Null`].
#[must_use]
pub fn resolve(root: &AttrValue, path: &str) -> Option<AttrValue> {
    if path.is_empty() {
        return present(root.clone());
    }
    walk(path, |head| member(root, head))
}

/// Resolve a dotted `path` starting at a record borrowed in place.
///
/// Behaves like [`resolve`] with an [`AttrValue::Record`] root, except that
/// the empty path yields `None` since the record cannot be returned by value.
#[must_use]
pub fn resolve_attr<A: Attributes + ?Sized>(record: &A, path: &str) -> Option<AttrValue> {
    if path.is_empty() {
        return None;
    }
    walk(path, |head| record.attr(head))
}

fn walk(path: &str, first: impl FnOnce(&str) -> Option<AttrValue>) -> Option<AttrValue> {
    let (head, rest) = path.split_once('.').unwrap_or((path, ""));
    let value = first(head)?;
    if rest.is_empty() {
        present(value)
    } else {
        resolve(&value, rest)
    }
}

fn member(value: &AttrValue, name: &str) -> Option<AttrValue> {
    match value {
        AttrValue::Map(entries) => entries.get(name).cloned(),
        AttrValue::Record(record) => record.attr(name),
        _ => None,
    }
}

fn present(value: AttrValue) -> Option<AttrValue> {
    (!value.is_null()).then_some(value)
}
