// `ok!` and `some!` are less bloaty alternatives to the standard library's try operator (`?`).
// Since we do not need type conversions in this crate we can fall back to much easier match
// patterns that compile faster and produce less bloaty code.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

macro_rules! some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => return None,
        }
    };
}

// Diagnostics go through `tracing` when the feature is on and compile to
// nothing otherwise.

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

/// Hidden utility module for the [`context!`](crate::context!) macro.
#[doc(hidden)]
pub mod __context {
    use crate::value::{Value, ValueMap};

    #[inline(always)]
    pub fn make() -> ValueMap {
        ValueMap::default()
    }

    #[inline(always)]
    pub fn add(ctx: &mut ValueMap, key: &'static str, value: Value) {
        ctx.insert(key.into(), value);
    }

    #[inline(always)]
    pub fn build(ctx: ValueMap) -> Value {
        Value::from(ctx)
    }
}

/// Creates a template context from keys and values.
///
/// ```rust
/// # use mandira::context;
/// let ctx = context!{
///     name => "Peter",
///     location => "World",
/// };
/// ```
///
/// Alternatively if the variable name matches the key name it can
/// be omitted:
///
/// ```rust
/// # use mandira::context;
/// let name = "Peter";
/// let ctx = context!{ name };
/// ```
///
/// The return value is a record [`Value`](crate::value::Value).  The macro
/// can be nested to build records inside of records or sequences:
///
/// ```rust
/// # use mandira::context;
/// let ctx = context! {
///     users => vec![
///         context!(Name => "Mike", Id => 1),
///         context!(Name => "Jane", Id => 2),
///     ]
/// };
/// ```
///
/// Values are converted with
/// [`Value::from_serialize`](crate::value::Value::from_serialize).  The
/// macro does not move passed values.
#[macro_export]
macro_rules! context {
    () => {
        $crate::__context::build($crate::__context::make())
    };
    (
        $($key:ident $(=> $value:expr)?),* $(,)?
    ) => {{
        let mut ctx = $crate::__context::make();
        $(
            $crate::__context_pair!(ctx, $key $(=> $value)?);
        )*
        $crate::__context::build(ctx)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __context_pair {
    ($ctx:ident, $key:ident) => {{
        $crate::__context_pair!($ctx, $key => $key);
    }};
    ($ctx:ident, $key:ident => $value:expr) => {
        $crate::__context::add(
            &mut $ctx,
            stringify!($key),
            $crate::value::Value::from_serialize(&$value),
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::value::{Value, ValueKind};

    #[test]
    fn test_context_macro() {
        let name = "Peter";
        let ctx = context! { name, age => 42 };
        assert_eq!(ctx.kind(), ValueKind::Record);
        assert_eq!(ctx.get_field("name"), Some(Value::from("Peter")));
        assert_eq!(ctx.get_field("age"), Some(Value::from(42)));
    }

    #[test]
    fn test_empty_context() {
        let ctx = context!();
        assert_eq!(ctx.len(), Some(0));
    }
}
