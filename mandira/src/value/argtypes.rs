use std::sync::Arc;

use crate::error::{Error, ErrorKind};
use crate::value::{Value, ValueKind, ValueRepr};

/// A utility trait that represents the return value of filters.
///
/// It's implemented for the following types:
///
/// * `Rv` where `Rv` implements `Into<Value>`
/// * `Result<Rv, Error>` where `Rv` implements `Into<Value>`
///
/// A filter returning an error makes the expression it is used in render
/// as empty text.
pub trait FunctionResult {
    #[doc(hidden)]
    fn into_result(self) -> Result<Value, Error>;
}

impl<I: Into<Value>> FunctionResult for Result<I, Error> {
    fn into_result(self) -> Result<Value, Error> {
        self.map(Into::into)
    }
}

impl<I: Into<Value>> FunctionResult for I {
    fn into_result(self) -> Result<Value, Error> {
        Ok(self.into())
    }
}

/// Helper trait representing valid filter arguments.
///
/// Since it's more convenient to write filters with concrete types instead
/// of values, this helper trait exists to automatically perform this
/// conversion.  It is implemented for filters up to an arity of 4
/// parameters, the first of which receives the filtered value.
///
/// For each argument the conversion is performed via the [`ArgType`]
/// trait.
pub trait FunctionArgs: Sized {
    /// Converts to function arguments from a slice of values.
    #[doc(hidden)]
    fn from_values(values: &[Value]) -> Result<Self, Error>;
}

/// A trait implemented by all filter argument types.
///
/// It's implemented for the following types:
///
/// * integers: [`i64`], [`usize`] (from integers, integral floats and
///   numeric strings)
/// * floats: [`f64`] (from numbers and numeric strings)
/// * bool: [`bool`]
/// * string: [`String`] (from any value by stringification)
/// * values: [`Value`]
///
/// The type is also implemented for optional values (`Option<T>`) which is
/// used to encode optional parameters.  An absent value is treated like a
/// missing optional parameter.
pub trait ArgType: Sized {
    #[doc(hidden)]
    fn from_value(value: Option<&Value>) -> Result<Self, Error>;
}

fn unsupported_conversion(kind: ValueKind, target: &str) -> Error {
    Error::new(
        ErrorKind::InvalidArguments,
        format!("cannot convert {} to {}", kind, target),
    )
}

fn missing_argument() -> Error {
    Error::new(ErrorKind::MissingArgument, "missing argument")
}

macro_rules! tuple_impls {
    ( $( $name:ident )* ) => {
        impl<$($name: ArgType,)*> FunctionArgs for ($($name,)*) {
            fn from_values(values: &[Value]) -> Result<Self, Error> {
                #![allow(non_snake_case, unused)]
                let mut idx = 0;
                $(
                    let $name = ok!($name::from_value(values.get(idx)));
                    idx += 1;
                )*
                if values.len() > idx {
                    Err(Error::new(ErrorKind::InvalidArguments, "too many arguments"))
                } else {
                    Ok(( $($name,)* ))
                }
            }
        }
    };
}

tuple_impls! {}
tuple_impls! { A }
tuple_impls! { A B }
tuple_impls! { A B C }
tuple_impls! { A B C D }

impl ArgType for Value {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => Ok(value.clone()),
            None => Err(missing_argument()),
        }
    }
}

impl ArgType for String {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => Ok(value.to_string()),
            None => Err(missing_argument()),
        }
    }
}

impl<T: ArgType> ArgType for Option<T> {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            None => Ok(None),
            Some(value) if value.is_none() => Ok(None),
            Some(value) => T::from_value(Some(value)).map(Some),
        }
    }
}

impl ArgType for bool {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => match value.0 {
                ValueRepr::Bool(val) => Ok(val),
                _ => Err(unsupported_conversion(value.kind(), "bool")),
            },
            None => Err(missing_argument()),
        }
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value.0 {
        ValueRepr::I64(val) => Some(val),
        ValueRepr::F64(val) if val as i64 as f64 == val => Some(val as i64),
        ValueRepr::String(ref s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ArgType for i64 {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => to_i64(value).ok_or_else(|| unsupported_conversion(value.kind(), "i64")),
            None => Err(missing_argument()),
        }
    }
}

impl ArgType for usize {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => to_i64(value)
                .and_then(|val| usize::try_from(val).ok())
                .ok_or_else(|| unsupported_conversion(value.kind(), "usize")),
            None => Err(missing_argument()),
        }
    }
}

impl ArgType for f64 {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(value) => match value.0 {
                ValueRepr::I64(val) => Ok(val as f64),
                ValueRepr::F64(val) => Ok(val),
                ValueRepr::String(ref s) => s
                    .trim()
                    .parse()
                    .map_err(|_| unsupported_conversion(value.kind(), "f64")),
                _ => Err(unsupported_conversion(value.kind(), "f64")),
            },
            None => Err(missing_argument()),
        }
    }
}

impl ArgType for Arc<str> {
    fn from_value(value: Option<&Value>) -> Result<Self, Error> {
        match value {
            Some(Value(ValueRepr::String(s))) => Ok(s.clone()),
            Some(value) => Ok(Arc::from(value.to_string())),
            None => Err(missing_argument()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(i64::from_value(Some(&Value::from("12"))).ok(), Some(12));
        assert_eq!(i64::from_value(Some(&Value::from(3.0))).ok(), Some(3));
        assert!(i64::from_value(Some(&Value::from(3.5))).is_err());
        assert!(usize::from_value(Some(&Value::from(-1))).is_err());
        assert_eq!(
            i64::from_value(None).unwrap_err().kind(),
            ErrorKind::MissingArgument
        );
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(
            String::from_value(Some(&Value::from(42))).ok(),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_tuple_arity() {
        let values = [Value::from("a"), Value::from(1)];
        let (a, b): (String, i64) = FunctionArgs::from_values(&values).unwrap();
        assert_eq!((a.as_str(), b), ("a", 1));
        let err = <(String,)>::from_values(&values).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        let (a, b): (String, Option<i64>) = FunctionArgs::from_values(&values[..1]).unwrap();
        assert_eq!((a.as_str(), b), ("a", None));
    }
}
