//! Filter functions and abstractions.
//!
//! Filters are functions which are applied to values to transform them.
//! The expression `{{name|index(0)|upper}}` looks up `name`, invokes the
//! filter `index` with the value and the argument `0` and then passes the
//! result on to `upper`.
//!
//! # Custom Filters
//!
//! A custom filter is a plain function which accepts at least the value
//! and is registered with [`add_filter`](crate::Environment::add_filter).
//! Further parameters receive the arguments of the filter call, converted
//! through [`ArgType`](crate::value::ArgType):
//!
//! ```
//! # use mandira::{context, Environment};
//! fn repeat(value: String, n: usize) -> String {
//!     value.repeat(n)
//! }
//!
//! let mut env = Environment::new();
//! env.add_filter("repeat", repeat);
//! let rv = env.render_str("{{word|repeat(3)}}", context! { word => "ab" }).unwrap();
//! assert_eq!(rv, "ababab");
//! ```
//!
//! A filter can fail by returning a [`Result`].  A failing filter, an
//! unknown filter or arguments that cannot be converted make the whole
//! expression render as empty text.
//!
//! # Built-in Filters
//!
//! With the `builtins` feature (on by default) the following filters are
//! registered in every [`Environment::new`](crate::Environment::new):
//! [`upper`], [`lower`], [`title`], [`len`], [`index`], [`format`],
//! [`join`] and [`divisibleby`].
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::value::{FunctionArgs, FunctionResult, Value};

type FilterFunc = dyn Fn(&[Value]) -> Result<Value, Error> + Sync + Send + 'static;

/// A type-erased filter.
#[derive(Clone)]
pub(crate) struct BoxedFilter(Arc<FilterFunc>);

/// A utility trait that represents filters.
///
/// It is implemented for functions and closures taking one to four
/// arguments where the first argument is the value being filtered.
pub trait Filter<Rv, Args>: Send + Sync + 'static {
    /// Applies a filter to value with the given arguments.
    #[doc(hidden)]
    fn apply_to(&self, args: Args) -> Rv;
}

macro_rules! tuple_impls {
    ( $( $name:ident )* ) => {
        impl<Func, Rv, $($name),*> Filter<Rv, ($($name,)*)> for Func
        where
            Func: Fn($($name),*) -> Rv + Send + Sync + 'static,
            Rv: FunctionResult,
        {
            fn apply_to(&self, args: ($($name,)*)) -> Rv {
                #[allow(non_snake_case)]
                let ($($name,)*) = args;
                (self)($($name,)*)
            }
        }
    };
}

tuple_impls! { A }
tuple_impls! { A B }
tuple_impls! { A B C }
tuple_impls! { A B C D }

impl BoxedFilter {
    /// Creates a new boxed filter.
    pub fn new<F, Rv, Args>(f: F) -> BoxedFilter
    where
        F: Filter<Rv, Args>,
        Rv: FunctionResult,
        Args: FunctionArgs,
    {
        BoxedFilter(Arc::new(move |args| -> Result<Value, Error> {
            f.apply_to(ok!(Args::from_values(args))).into_result()
        }))
    }

    /// Applies the filter.  The first argument is the filtered value.
    pub fn apply_to(&self, args: &[Value]) -> Result<Value, Error> {
        (self.0)(args)
    }
}

impl fmt::Debug for BoxedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedFilter")
    }
}

pub(crate) fn get_builtin_filters() -> BTreeMap<std::borrow::Cow<'static, str>, BoxedFilter> {
    #[allow(unused_mut)]
    let mut rv = BTreeMap::new();
    #[cfg(feature = "builtins")]
    {
        rv.insert("upper".into(), BoxedFilter::new(builtins::upper));
        rv.insert("lower".into(), BoxedFilter::new(builtins::lower));
        rv.insert("title".into(), BoxedFilter::new(builtins::title));
        rv.insert("len".into(), BoxedFilter::new(builtins::len));
        rv.insert("index".into(), BoxedFilter::new(builtins::index));
        rv.insert("format".into(), BoxedFilter::new(builtins::format));
        rv.insert("join".into(), BoxedFilter::new(builtins::join));
        rv.insert("divisibleby".into(), BoxedFilter::new(builtins::divisibleby));
    }
    rv
}

#[cfg(feature = "builtins")]
mod builtins {
    use super::*;

    use crate::error::ErrorKind;
    use crate::format_utils::sprintf;

    /// Converts a value to uppercase.
    ///
    /// ```text
    /// <h1>{{chapter.title|upper}}</h1>
    /// ```
    pub fn upper(v: String) -> String {
        v.to_uppercase()
    }

    /// Converts a value to lowercase.
    pub fn lower(v: String) -> String {
        v.to_lowercase()
    }

    /// Uppercases the first letter of every word.
    ///
    /// Words are separated by whitespace and punctuation.  The remaining
    /// letters keep their case.
    pub fn title(v: String) -> String {
        let mut rv = String::with_capacity(v.len());
        let mut capitalize = true;
        for c in v.chars() {
            if c.is_ascii_punctuation() || c.is_whitespace() {
                rv.push(c);
                capitalize = true;
            } else if capitalize {
                rv.extend(c.to_uppercase());
                capitalize = false;
            } else {
                rv.push(c);
            }
        }
        rv
    }

    /// Returns the length of the value.
    ///
    /// Strings count characters, sequences items and records entries.
    /// Everything else has a length of `0`.
    pub fn len(v: Value) -> usize {
        v.len().unwrap_or(0)
    }

    /// Returns the item at a position of a sequence or the character at a
    /// position of a string.
    ///
    /// Out of range positions produce an empty string.
    ///
    /// ```text
    /// {{names|index(0)|upper}}
    /// ```
    pub fn index(v: Value, idx: i64) -> Value {
        usize::try_from(idx)
            .ok()
            .and_then(|idx| v.get_item(idx))
            .unwrap_or_else(|| Value::from(""))
    }

    /// Formats the value with a printf style format string.
    ///
    /// ```text
    /// {{price|format("$%.2f")}}
    /// ```
    pub fn format(v: Value, fmt: String) -> Result<String, Error> {
        sprintf(&fmt, &[v])
    }

    /// Joins the items of a sequence with a separator.
    ///
    /// Values that are not sequences produce an empty string.
    pub fn join(v: Value, sep: String) -> String {
        let mut rv = String::new();
        for (idx, item) in v.iter().enumerate() {
            if idx > 0 {
                rv.push_str(&sep);
            }
            rv.push_str(&item.to_string());
        }
        rv
    }

    /// Checks if an integer is divisible by another one.
    ///
    /// ```text
    /// {{?if .index1|divisibleby(3)}}<hr>{{/if}}
    /// ```
    pub fn divisibleby(v: i64, divisor: i64) -> Result<bool, Error> {
        if divisor == 0 {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "cannot divide by zero",
            ));
        }
        Ok(v.wrapping_rem(divisor) == 0)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_title() {
            assert_eq!(title("bob".into()), "Bob");
            assert_eq!(title("hello wORLD-foo".into()), "Hello WORLD-Foo");
        }

        #[test]
        fn test_index() {
            let names = Value::from(vec!["john", "bob"]);
            assert_eq!(index(names.clone(), 1), Value::from("bob"));
            assert_eq!(index(names.clone(), 5), Value::from(""));
            assert_eq!(index(names, -1), Value::from(""));
            assert_eq!(index(Value::from("hello"), 4), Value::from("o"));
        }

        #[test]
        fn test_len_and_join() {
            assert_eq!(len(Value::from("héllo")), 5);
            assert_eq!(len(Value::from(42)), 0);
            assert_eq!(join(Value::from(vec![1, 2, 3]), ", ".into()), "1, 2, 3");
            assert_eq!(join(Value::from("abc"), ", ".into()), "");
        }

        #[test]
        fn test_divisibleby() {
            assert_eq!(divisibleby(6, 3).ok(), Some(true));
            assert_eq!(divisibleby(5, 2).ok(), Some(false));
            assert_eq!(
                divisibleby(5, 0).unwrap_err().kind(),
                ErrorKind::InvalidOperation
            );
        }

        #[test]
        fn test_boxed_filter_coerces() {
            let f = BoxedFilter::new(divisibleby);
            assert_eq!(
                f.apply_to(&[Value::from(10), Value::from("5")]).unwrap(),
                Value::from(true)
            );
            assert!(f.apply_to(&[Value::from(10)]).is_err());
        }
    }
}

#[cfg(feature = "builtins")]
pub use self::builtins::*;
