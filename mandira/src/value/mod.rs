//! Provides a dynamic value type abstraction.
//!
//! This module gives access to a dynamically typed value which is used by
//! the template engine during execution.
//!
//! For the most part the existence of the value type can be ignored as
//! mandira will perform the necessary conversions for you.  For instance
//! if you write a filter that converts a string you can directly declare
//! the filter to take a [`String`].  However for some more advanced use
//! cases it's useful to know that this type exists.
//!
//! # Converting Values
//!
//! Values are typically created via the [`From`] trait:
//!
//! ```
//! # use mandira::value::Value;
//! let int_value = Value::from(42);
//! let none_value = Value::from(());
//! let true_value = Value::from(true);
//! ```
//!
//! Or via the [`FromIterator`] trait:
//!
//! ```
//! # use mandira::value::Value;
//! // collection into a sequence
//! let value: Value = (1..10).into_iter().collect();
//!
//! // collection into a record
//! let value: Value = [("key", "value")].into_iter().collect();
//! ```
//!
//! Any type implementing [`serde::Serialize`] can be converted with
//! [`Value::from_serialize`].  Types that want to resolve fields lazily
//! or expose methods to templates implement [`Object`] instead.
//!
//! # Records
//!
//! A record is anything names can be resolved against: maps, serialized
//! structs and [`Object`]s.  When a section tag resolves to a record the
//! record becomes the innermost frame of the context chain for the
//! section body.
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

pub use crate::value::argtypes::{ArgType, FunctionArgs, FunctionResult};
pub use crate::value::object::Object;

mod argtypes;
mod object;
pub(crate) mod ops;
mod serialize;

#[cfg(feature = "preserve_order")]
/// The map type backing record values.
pub type ValueMap = indexmap::IndexMap<Arc<str>, Value>;

#[cfg(not(feature = "preserve_order"))]
/// The map type backing record values.
pub type ValueMap = std::collections::BTreeMap<Arc<str>, Value>;

/// Describes the kind of value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueKind {
    /// The value is the absent value (`null`).
    None,
    /// The value is a [`bool`]
    Bool,
    /// The value is a number of a supported type.
    Number,
    /// The value is a string.
    String,
    /// The value is a sequence of other values.
    Seq,
    /// The value is a record (map or object).
    Record,
    /// The value is a bound zero-argument callable.
    Callable,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Record => "record",
            ValueKind::Callable => "callable",
        })
    }
}

type Callable = dyn Fn() -> Value + Send + Sync + 'static;

#[derive(Clone)]
pub(crate) enum ValueRepr {
    None,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(Arc<str>),
    Seq(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Object(Arc<dyn Object>),
    Callable(Arc<Callable>),
}

impl fmt::Debug for ValueRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRepr::None => f.write_str("none"),
            ValueRepr::Bool(val) => fmt::Debug::fmt(val, f),
            ValueRepr::I64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::F64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::String(val) => fmt::Debug::fmt(val, f),
            ValueRepr::Seq(val) => f.debug_list().entries(val.iter()).finish(),
            ValueRepr::Map(val) => f.debug_map().entries(val.iter()).finish(),
            ValueRepr::Object(val) => fmt::Debug::fmt(val, f),
            ValueRepr::Callable(_) => f.write_str("<callable>"),
        }
    }
}

/// Represents a dynamically typed value in the template engine.
///
/// Values are immutable and cheap to clone: strings, sequences and records
/// are reference counted and never copied after they were created.
#[derive(Clone)]
pub struct Value(pub(crate) ValueRepr);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (ValueRepr::None, ValueRepr::None) => true,
            (ValueRepr::String(a), ValueRepr::String(b)) => a == b,
            (ValueRepr::Bool(a), ValueRepr::Bool(b)) => a == b,
            (ValueRepr::Seq(a), ValueRepr::Seq(b)) => a == b,
            (ValueRepr::Map(a), ValueRepr::Map(b)) => a == b,
            (ValueRepr::Object(a), ValueRepr::Object(b)) => Arc::ptr_eq(a, b),
            (ValueRepr::Callable(a), ValueRepr::Callable(b)) => Arc::ptr_eq(a, b),
            _ => ops::coerce(self, other)
                .map(|pair| pair.is_eq())
                .unwrap_or(false),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ValueRepr::None => Ok(()),
            ValueRepr::Bool(val) => fmt::Display::fmt(val, f),
            ValueRepr::I64(val) => fmt::Display::fmt(val, f),
            ValueRepr::F64(val) => {
                if val.is_nan() {
                    f.write_str("NaN")
                } else if val.is_infinite() {
                    write!(f, "{}Inf", if val.is_sign_negative() { "-" } else { "+" })
                } else {
                    fmt::Display::fmt(val, f)
                }
            }
            ValueRepr::String(val) => f.write_str(val),
            ValueRepr::Seq(items) => {
                ok!(f.write_str("["));
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(fmt::Display::fmt(item, f));
                }
                f.write_str("]")
            }
            ValueRepr::Map(map) => {
                ok!(f.write_str("{"));
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(write!(f, "{}: {}", key, value));
                }
                f.write_str("}")
            }
            ValueRepr::Object(obj) => fmt::Display::fmt(obj, f),
            ValueRepr::Callable(_) => f.write_str("<callable>"),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::NONE
    }
}

impl Value {
    /// The absent value.
    pub const NONE: Value = Value(ValueRepr::None);

    /// Creates a value from a dynamic object.
    ///
    /// ```
    /// # use mandira::value::{Value, Object};
    /// #[derive(Debug)]
    /// struct Thing;
    ///
    /// impl std::fmt::Display for Thing {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         f.write_str("thing")
    ///     }
    /// }
    ///
    /// impl Object for Thing {}
    ///
    /// let val = Value::from_object(Thing);
    /// assert_eq!(val.to_string(), "thing");
    /// ```
    pub fn from_object<T: Object + 'static>(value: T) -> Value {
        Value(ValueRepr::Object(Arc::new(value)))
    }

    /// Creates a value from a reference counted dynamic object.
    pub fn from_arc_object<T: Object + 'static>(value: Arc<T>) -> Value {
        Value(ValueRepr::Object(value as Arc<dyn Object>))
    }

    /// Creates a bound zero-argument callable.
    ///
    /// When name resolution lands on a callable stored in a record the
    /// callable is invoked and its return value is used instead.
    ///
    /// ```
    /// # use mandira::{context, render, Value};
    /// let ctx = context! { greeting => Value::from_function(|| Value::from("hi")) };
    /// assert_eq!(render("{{greeting}}", ctx).unwrap(), "hi");
    /// ```
    pub fn from_function<F, Rv>(f: F) -> Value
    where
        F: Fn() -> Rv + Send + Sync + 'static,
        Rv: Into<Value>,
    {
        Value(ValueRepr::Callable(Arc::new(move || f().into())))
    }

    /// Returns the kind of the value.
    pub fn kind(&self) -> ValueKind {
        match self.0 {
            ValueRepr::None => ValueKind::None,
            ValueRepr::Bool(_) => ValueKind::Bool,
            ValueRepr::I64(_) | ValueRepr::F64(_) => ValueKind::Number,
            ValueRepr::String(_) => ValueKind::String,
            ValueRepr::Seq(_) => ValueKind::Seq,
            ValueRepr::Map(_) | ValueRepr::Object(_) => ValueKind::Record,
            ValueRepr::Callable(_) => ValueKind::Callable,
        }
    }

    /// Returns `true` if the value is the absent value.
    pub fn is_none(&self) -> bool {
        matches!(self.0, ValueRepr::None)
    }

    /// Returns the value as string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            ValueRepr::String(s) => Some(s as &str),
            _ => None,
        }
    }

    /// Returns the value as slice if it is a sequence.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match &self.0 {
            ValueRepr::Seq(items) => Some(&items[..]),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            ValueRepr::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the length of the contained value.
    ///
    /// Strings count characters, sequences their items and maps their
    /// entries.  Other values have no length.
    pub fn len(&self) -> Option<usize> {
        match &self.0 {
            ValueRepr::String(s) => Some(s.chars().count()),
            ValueRepr::Seq(items) => Some(items.len()),
            ValueRepr::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Returns `true` when the value is empty or has no length.
    pub fn is_empty(&self) -> bool {
        self.len().map_or(true, |len| len == 0)
    }

    /// Checks if the value counts as "falsy" for a section tag.
    ///
    /// Absent values, `false`, the empty string and the empty sequence
    /// are falsy.  Everything else, including `0` and empty records, is
    /// not.
    pub fn is_falsy(&self) -> bool {
        match &self.0 {
            ValueRepr::None => true,
            ValueRepr::Bool(val) => !val,
            ValueRepr::String(s) => s.is_empty(),
            ValueRepr::Seq(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Checks if the value is true for a conditional tag.
    ///
    /// Only `false`, the empty string and the absent value are false.
    pub fn is_true(&self) -> bool {
        match &self.0 {
            ValueRepr::None => false,
            ValueRepr::Bool(val) => *val,
            ValueRepr::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Looks up a field or key on a record.
    ///
    /// Callables found in a record are invoked and their result is
    /// returned in their place.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        let rv = match &self.0 {
            ValueRepr::Map(map) => map.get(name).cloned(),
            ValueRepr::Object(obj) => obj.get_field(name),
            _ => None,
        };
        rv.map(Value::invoke_bound)
    }

    /// Calls a zero-argument method on the value.
    ///
    /// Only [`Object`]s have methods.  For everything else this returns an
    /// [`UnknownMethod`](crate::ErrorKind::UnknownMethod) error.
    pub fn call_method(&self, name: &str) -> Result<Value, Error> {
        match &self.0 {
            ValueRepr::Object(obj) => obj.call_method(name),
            _ => Err(Error::new(
                crate::ErrorKind::UnknownMethod,
                format!("{} has no method named {}", self.kind(), name),
            )),
        }
    }

    /// Returns the item at the given position of a sequence, or the
    /// character at that position of a string.
    pub fn get_item(&self, idx: usize) -> Option<Value> {
        match &self.0 {
            ValueRepr::Seq(items) => items.get(idx).cloned(),
            ValueRepr::String(s) => s.chars().nth(idx).map(Value::from),
            _ => None,
        }
    }

    /// Iterates over the items of a sequence.
    ///
    /// Values that are not sequences yield nothing.
    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        self.as_slice().unwrap_or_default().iter()
    }

    pub(crate) fn invoke_bound(self) -> Value {
        match self.0 {
            ValueRepr::Callable(ref f) => f(),
            _ => self,
        }
    }
}

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Value {
        Value::NONE
    }
}

impl From<bool> for Value {
    #[inline(always)]
    fn from(val: bool) -> Value {
        Value(ValueRepr::Bool(val))
    }
}

macro_rules! int_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline(always)]
                fn from(val: $ty) -> Value {
                    Value(ValueRepr::I64(val as i64))
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_int_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Value {
                    match i64::try_from(val) {
                        Ok(val) => Value(ValueRepr::I64(val)),
                        Err(_) => Value(ValueRepr::F64(val as f64)),
                    }
                }
            }
        )*
    };
}

wide_int_into_value!(u64, usize);

impl From<f32> for Value {
    #[inline(always)]
    fn from(val: f32) -> Value {
        Value(ValueRepr::F64(val as f64))
    }
}

impl From<f64> for Value {
    #[inline(always)]
    fn from(val: f64) -> Value {
        Value(ValueRepr::F64(val))
    }
}

impl From<char> for Value {
    fn from(val: char) -> Value {
        Value(ValueRepr::String(Arc::from(val.to_string())))
    }
}

impl<'a> From<&'a str> for Value {
    #[inline(always)]
    fn from(val: &'a str) -> Value {
        Value(ValueRepr::String(Arc::from(val)))
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(val: String) -> Value {
        Value(ValueRepr::String(Arc::from(val)))
    }
}

impl From<Arc<str>> for Value {
    #[inline(always)]
    fn from(val: Arc<str>) -> Value {
        Value(ValueRepr::String(val))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(val: Vec<T>) -> Value {
        val.into_iter().collect()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(val: Option<T>) -> Value {
        match val {
            Some(val) => val.into(),
            None => Value::NONE,
        }
    }
}

impl From<ValueMap> for Value {
    fn from(val: ValueMap) -> Value {
        Value(ValueRepr::Map(Arc::new(val)))
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().map(Into::into).collect();
        Value(ValueRepr::Seq(Arc::new(items)))
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: ValueMap = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::from(map)
    }
}
