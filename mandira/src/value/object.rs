use std::fmt;

use crate::error::{Error, ErrorKind};
use crate::value::Value;

/// A utility trait that represents a dynamic record.
///
/// Serialized maps and structs are the common way to hand data to a
/// template, but some types want to resolve names lazily or expose
/// zero-argument methods.  Such a type implements [`Object`] and is wrapped
/// in a value with [`Value::from_object`].  The ownership of the object
/// then moves into the value.
///
/// Objects are always records: a section tag that resolves to an object
/// pushes it as the innermost frame of the context chain.
///
/// Objects need to implement [`Display`](std::fmt::Display) which is used
/// when the object itself is printed.  Additionally
/// [`Debug`](std::fmt::Debug) is required as well.
///
/// ```
/// use std::fmt;
/// use mandira::value::{Object, Value};
/// use mandira::{Error, ErrorKind};
///
/// #[derive(Debug)]
/// struct Category {
///     tag: String,
///     description: String,
/// }
///
/// impl fmt::Display for Category {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}", self.tag)
///     }
/// }
///
/// impl Object for Category {
///     fn get_field(&self, name: &str) -> Option<Value> {
///         match name {
///             "Tag" => Some(Value::from(self.tag.clone())),
///             _ => None,
///         }
///     }
///
///     fn call_method(&self, name: &str) -> Result<Value, Error> {
///         match name {
///             "DisplayName" => Ok(Value::from(format!("{} - {}", self.tag, self.description))),
///             _ => Err(Error::from(ErrorKind::UnknownMethod)),
///         }
///     }
/// }
/// ```
pub trait Object: fmt::Display + fmt::Debug + Send + Sync {
    /// Resolves a field or key by name.
    ///
    /// Returning `None` lets name resolution continue with the next frame
    /// of the context chain.
    fn get_field(&self, name: &str) -> Option<Value> {
        let _name = name;
        None
    }

    /// Called when the engine tries to call a zero-argument method.
    ///
    /// Methods are consulted before fields.  If the method is not known an
    /// [`ErrorKind::UnknownMethod`] error must be returned.  Any other error
    /// is treated as the method producing no value.
    fn call_method(&self, name: &str) -> Result<Value, Error> {
        Err(Error::new(
            ErrorKind::UnknownMethod,
            format!("object has no method named {}", name),
        ))
    }
}
