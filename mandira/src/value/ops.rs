use std::cmp::Ordering;

use crate::compiler::ast::CmpOp;
use crate::value::{Value, ValueRepr};

pub enum CoerceResult<'a> {
    I64(i64, i64),
    F64(f64, f64),
    Str(&'a str, &'a str),
}

impl CoerceResult<'_> {
    pub fn ordering(&self) -> Option<Ordering> {
        match *self {
            CoerceResult::I64(a, b) => Some(a.cmp(&b)),
            CoerceResult::F64(a, b) => a.partial_cmp(&b),
            CoerceResult::Str(a, b) => Some(a.cmp(b)),
        }
    }

    pub fn is_eq(&self) -> bool {
        self.ordering() == Some(Ordering::Equal)
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value.0 {
        ValueRepr::I64(x) => Some(x as f64),
        ValueRepr::F64(x) => Some(x),
        _ => None,
    }
}

/// Brings two values into a common comparable representation.
///
/// Integers and floats compare numerically, strings lexicographically.
/// Any other pairing has no ordering.
pub fn coerce<'x>(a: &'x Value, b: &'x Value) -> Option<CoerceResult<'x>> {
    match (&a.0, &b.0) {
        (ValueRepr::I64(a), ValueRepr::I64(b)) => Some(CoerceResult::I64(*a, *b)),
        (ValueRepr::String(a), ValueRepr::String(b)) => Some(CoerceResult::Str(a, b)),
        (ValueRepr::F64(a), _) => Some(CoerceResult::F64(*a, some!(as_f64(b)))),
        (_, ValueRepr::F64(b)) => Some(CoerceResult::F64(some!(as_f64(a)), *b)),
        _ => None,
    }
}

/// Applies a comparison operator to two values.
///
/// `==` and `!=` compare structurally, so values of unrelated kinds are
/// never equal.  The ordering operators yield `false` when the two values
/// cannot be ordered against each other.
pub fn compare(op: CmpOp, a: &Value, b: &Value) -> bool {
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        _ => {
            let ordering = match coerce(a, b).and_then(|x| x.ordering()) {
                Some(ordering) => ordering,
                None => {
                    debug!(left = ?a, right = ?b, "values cannot be ordered");
                    return false;
                }
            };
            match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Lte => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::Gte => ordering != Ordering::Less,
                CmpOp::Eq | CmpOp::Ne => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert!(compare(CmpOp::Gt, &Value::from(5), &Value::from(4.5)));
        assert!(compare(CmpOp::Eq, &Value::from(2), &Value::from(2.0)));
        assert!(compare(CmpOp::Lte, &Value::from(4), &Value::from(4)));
        assert!(!compare(CmpOp::Gt, &Value::from(4), &Value::from(4)));
    }

    #[test]
    fn test_strings() {
        assert!(compare(CmpOp::Lt, &Value::from("apple"), &Value::from("banana")));
        assert!(compare(CmpOp::Eq, &Value::from("john"), &Value::from("john")));
        assert!(compare(CmpOp::Ne, &Value::from("john"), &Value::from("ted")));
    }

    #[test]
    fn test_mismatched_kinds() {
        assert!(!compare(CmpOp::Lt, &Value::from("1"), &Value::from(2)));
        assert!(!compare(CmpOp::Gte, &Value::from(true), &Value::from(false)));
        assert!(!compare(CmpOp::Eq, &Value::from("1"), &Value::from(1)));
        assert!(compare(CmpOp::Ne, &Value::from("1"), &Value::from(1)));
        assert!(compare(CmpOp::Eq, &Value::from(true), &Value::from(true)));
    }
}
