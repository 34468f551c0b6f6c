//! Marshaling between runtime objects and host-level values.
//!
//! This is the whole contract the native-extension bridge relies on: build
//! an object from whatever a native call returned, and pull a host value
//! out of an object to pass as an argument.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::builtins;
use crate::interpreter::object::{json_string, Object};

/// A host-level value.
#[derive(Clone)]
pub enum HostValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Array(Vec<HostValue>),
    Map(IndexMap<String, HostValue>),
    /// Anything else; it crosses the boundary untouched.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl HostValue {
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        HostValue::Opaque(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            HostValue::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Integer(a), HostValue::Integer(b)) => a == b,
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Map(a), HostValue::Map(b)) => a == b,
            (HostValue::Opaque(a), HostValue::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "Null"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Integer(i) => write!(f, "Integer({})", i),
            HostValue::String(s) => write!(f, "String({:?})", s),
            HostValue::Array(items) => f.debug_tuple("Array").field(items).finish(),
            HostValue::Map(map) => f.debug_tuple("Map").field(map).finish(),
            HostValue::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl TryFrom<serde_json::Value> for HostValue {
    type Error = RuntimeError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => HostValue::Null,
            serde_json::Value::Bool(b) => HostValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Integer(i),
                None => return Err(RuntimeError::marshal(format!("unsupported number {}", n))),
            },
            serde_json::Value::String(s) => HostValue::String(s),
            serde_json::Value::Array(items) => HostValue::Array(
                items
                    .into_iter()
                    .map(HostValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut pairs = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    pairs.insert(key, HostValue::try_from(value)?);
                }
                HostValue::Map(pairs)
            }
        })
    }
}

impl TryFrom<&HostValue> for serde_json::Value {
    type Error = RuntimeError;

    fn try_from(value: &HostValue) -> Result<Self, Self::Error> {
        Ok(match value {
            HostValue::Null => serde_json::Value::Null,
            HostValue::Bool(b) => serde_json::Value::Bool(*b),
            HostValue::Integer(i) => serde_json::Value::from(*i),
            HostValue::String(s) => serde_json::Value::String(s.clone()),
            HostValue::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            HostValue::Map(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), serde_json::Value::try_from(value)?);
                }
                serde_json::Value::Object(object)
            }
            HostValue::Opaque(_) => {
                return Err(RuntimeError::marshal("opaque host values have no JSON form"))
            }
        })
    }
}

/// An object wrapping an opaque host value.
pub struct HostObject {
    base: BaseObject,
    value: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub const CLASS_NAME: &'static str = "HostObject";

    pub fn new(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            base: BaseObject::new(builtins().host_class.clone()),
            value,
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn value(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.value
    }

    pub fn equal_to(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    pub(crate) fn to_json(&self) -> String {
        json_string(&format!("#<{}:{} >", self.base.class().name(), self.base.id()))
    }
}

impl Object {
    /// Build an object from a host value. Maps become plain hashes.
    pub fn from_host(value: HostValue) -> Object {
        match value {
            HostValue::Null => Object::null(),
            HostValue::Bool(b) => Object::boolean(b),
            HostValue::Integer(i) => Object::integer(i),
            HostValue::String(s) => Object::string(s),
            HostValue::Array(items) => {
                Object::array(items.into_iter().map(Object::from_host).collect())
            }
            HostValue::Map(map) => Object::hash(
                map.into_iter()
                    .map(|(key, value)| (key, Object::from_host(value)))
                    .collect(),
            ),
            HostValue::Opaque(value) => Object::Host(Arc::new(HostObject::new(value))),
        }
    }

    /// Extract the host-level value.
    pub fn value(&self) -> HostValue {
        match self {
            Object::Null(_) => HostValue::Null,
            Object::Boolean(b) => HostValue::Bool(b.value()),
            Object::Integer(i) => HostValue::Integer(i.value()),
            Object::String(s) => HostValue::String(s.value().to_string()),
            Object::Array(a) => HostValue::Array(a.elements().iter().map(Object::value).collect()),
            Object::ConcurrentArray(a) => {
                HostValue::Array(a.snapshot().iter().map(Object::value).collect())
            }
            Object::Hash(h) => HostValue::Map(
                h.pairs()
                    .into_iter()
                    .map(|(key, value)| (key, value.value()))
                    .collect(),
            ),
            Object::ConcurrentHash(h) => HostValue::Map(
                h.snapshot()
                    .into_iter()
                    .map(|(key, value)| (key, value.value()))
                    .collect(),
            ),
            Object::Error(e) => HostValue::String(e.message().to_string()),
            Object::Host(h) => HostValue::Opaque(h.value().clone()),
            Object::Class(_) | Object::Method(_) | Object::Instance(_) => {
                HostValue::String(self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_through_objects() {
        let mut map = IndexMap::new();
        map.insert("name".to_string(), HostValue::String("corvid".into()));
        map.insert(
            "tags".to_string(),
            HostValue::Array(vec![HostValue::Integer(1), HostValue::Null]),
        );
        let original = HostValue::Map(map);

        let object = Object::from_host(original.clone());
        assert_eq!(object.class_name(), "Hash");
        assert_eq!(object.value(), original);
    }

    #[test]
    fn test_opaque_values_are_wrapped() {
        let object = Object::from_host(HostValue::opaque(42u32));
        assert_eq!(object.class_name(), "HostObject");
        assert_eq!(object.value().downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value = serde_json::from_str(r#"{"a": [1, true, "x"]}"#).unwrap();
        let host = HostValue::try_from(json.clone()).unwrap();
        let back = serde_json::Value::try_from(&host).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_float_is_rejected() {
        let json: serde_json::Value = serde_json::from_str("1.5").unwrap();
        assert!(matches!(
            HostValue::try_from(json),
            Err(RuntimeError::Marshal(_))
        ));
    }
}
