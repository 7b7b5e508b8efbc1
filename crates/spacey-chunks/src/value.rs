// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values exchanged between module factories.
//!
//! Module exports are shared, mutable objects. A property is either a plain
//! data slot or a getter; getters are how ESM live bindings are expressed, so
//! reading a property always runs the getter at read time.

use crate::error::{Result, RuntimeError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Property holding the ESM marker on an exports object
pub const ES_MODULE_MARKER: &str = "__esModule";

/// A getter backing a live export binding
pub type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// Signature of a native function value
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A dynamic value.
///
/// Objects and functions are reference types: cloning a `Value` shares the
/// underlying object, and equality on them is identity.
#[derive(Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object reference
    Object(ObjectRef),
    /// Function reference
    Function(Function),
}

impl Value {
    /// Create a fresh empty object value
    pub fn object() -> Self {
        Value::Object(ObjectRef::new())
    }

    /// Returns the object behind this value, if it is one
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Reads a property; non-objects have no properties
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(obj) => obj.get(key),
            _ => Value::Undefined,
        }
    }

    /// Calls this value as a function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(func) => func.call(args),
            other => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    /// Whether this value is an object carrying the ESM marker
    pub fn is_es_module(&self) -> bool {
        self.as_object().is_some_and(ObjectRef::is_es_module)
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => match func.name() {
                Some(name) => write!(f, "[Function: {}]", name),
                None => write!(f, "[Function (anonymous)]"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "Object {:?}", obj.keys()),
            other => write!(f, "{}", other),
        }
    }
}

/// A native function value
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    call: Arc<NativeFn>,
}

impl Function {
    /// Wraps a closure as a function value
    pub fn new(
        name: Option<&str>,
        call: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.map(str::to_string),
            call: Arc::new(call),
        }
    }

    /// The function name (if any)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Invokes the function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.call)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

/// Storage behind a property
#[derive(Clone)]
pub enum Slot {
    /// A plain value
    Data(Value),
    /// A getter evaluated on every read
    Getter(Getter),
}

/// A property descriptor
#[derive(Clone)]
pub struct Property {
    /// Where the value comes from
    pub slot: Slot,
    /// Whether the property shows up in key enumeration
    pub enumerable: bool,
}

/// An object with insertion-ordered properties
#[derive(Clone, Default)]
pub struct Object {
    properties: IndexMap<String, Property>,
    frozen: bool,
}

/// Shared handle to an [`Object`]
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a property, running its getter if it has one.
    ///
    /// The object lock is released before the getter runs, so getters may
    /// read other properties of the same object.
    pub fn get(&self, key: &str) -> Value {
        let slot = match self.0.read().properties.get(key) {
            Some(prop) => prop.slot.clone(),
            None => return Value::Undefined,
        };
        match slot {
            Slot::Data(value) => value,
            Slot::Getter(getter) => getter(),
        }
    }

    /// Assigns a data property.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let mut obj = self.0.write();
        if obj.frozen {
            return Err(RuntimeError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            )));
        }
        match obj.properties.get_mut(&key) {
            Some(Property {
                slot: Slot::Getter(_),
                ..
            }) => Err(RuntimeError::type_error(format!(
                "Cannot set property {} of object which has only a getter",
                key
            ))),
            Some(prop) => {
                prop.slot = Slot::Data(value.into());
                Ok(())
            }
            None => {
                obj.properties.insert(
                    key,
                    Property {
                        slot: Slot::Data(value.into()),
                        enumerable: true,
                    },
                );
                Ok(())
            }
        }
    }

    /// Defines a property unless the object already owns one with that key.
    ///
    /// Returns whether the property was added.
    pub fn define(&self, key: impl Into<String>, property: Property) -> bool {
        let key = key.into();
        let mut obj = self.0.write();
        if obj.frozen || obj.properties.contains_key(&key) {
            return false;
        }
        obj.properties.insert(key, property);
        true
    }

    /// Defines an enumerable getter unless the key is already owned
    pub fn define_getter(&self, key: impl Into<String>, getter: Getter) -> bool {
        self.define(
            key,
            Property {
                slot: Slot::Getter(getter),
                enumerable: true,
            },
        )
    }

    /// Removes a property. Frozen objects keep their properties.
    pub fn delete(&self, key: &str) -> bool {
        let mut obj = self.0.write();
        if obj.frozen {
            return false;
        }
        obj.properties.shift_remove(key).is_some()
    }

    /// Checks if a property exists.
    pub fn has(&self, key: &str) -> bool {
        self.0.read().properties.contains_key(key)
    }

    /// Enumerable keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.0
            .read()
            .properties
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whether the object carries the ESM marker
    pub fn is_es_module(&self) -> bool {
        self.get(ES_MODULE_MARKER).to_boolean()
    }

    /// Adds the non-enumerable ESM marker
    pub fn mark_es_module(&self) {
        self.define(
            ES_MODULE_MARKER,
            Property {
                slot: Slot::Data(Value::Boolean(true)),
                enumerable: false,
            },
        );
    }

    /// Makes the object read-only
    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    /// Whether the object is read-only
    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object {:?}", self.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Value::object();
        let b = Value::object();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_getter_runs_on_every_read() {
        let reads = Arc::new(AtomicUsize::new(0));
        let obj = ObjectRef::new();
        let counter = Arc::clone(&reads);
        obj.define_getter(
            "count",
            Arc::new(move || Value::Number(counter.fetch_add(1, Ordering::SeqCst) as f64)),
        );

        assert_eq!(obj.get("count"), Value::Number(0.0));
        assert_eq!(obj.get("count"), Value::Number(1.0));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_define_keeps_existing_property() {
        let obj = ObjectRef::new();
        obj.set("a", 1).unwrap();
        assert!(!obj.define_getter("a", Arc::new(|| Value::Number(2.0))));
        assert_eq!(obj.get("a"), Value::Number(1.0));
    }

    #[test]
    fn test_frozen_object_rejects_writes() {
        let obj = ObjectRef::new();
        obj.set("a", "x").unwrap();
        obj.freeze();

        assert!(matches!(obj.set("a", "y"), Err(RuntimeError::TypeError(_))));
        assert!(!obj.delete("a"));
        assert_eq!(obj.get("a"), Value::from("x"));
    }

    #[test]
    fn test_marker_is_not_enumerable() {
        let obj = ObjectRef::new();
        obj.set("named", true).unwrap();
        obj.mark_es_module();

        assert!(obj.is_es_module());
        assert_eq!(obj.keys(), vec!["named".to_string()]);
    }

    #[test]
    fn test_call_non_function() {
        let err = Value::from(3).call(&[]).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: number is not a function");

        let add = Function::new(Some("add"), |args| {
            let sum = args
                .iter()
                .map(|v| match v {
                    Value::Number(n) => *n,
                    _ => 0.0,
                })
                .sum::<f64>();
            Ok(Value::Number(sum))
        });
        assert_eq!(
            Value::from(add).call(&[Value::from(1), Value::from(2)]).unwrap(),
            Value::Number(3.0)
        );
    }
}
