use std::fmt;

use crate::value::Value;

/// A name resolved against the context chain at render time.
///
/// `.` refers to the current value, `.index` and `.index1` to the position
/// of the current item while iterating a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupExpr {
    pub name: String,
}

/// An argument to a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Const(Value),
    Lookup(LookupExpr),
}

/// A filter invocation (`|name(arg, ...)`).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Arg>,
}

/// A lookup followed by a chain of filters.
#[derive(Debug, Clone, PartialEq)]
pub struct VarExpr {
    pub lookup: LookupExpr,
    pub filters: Vec<FilterCall>,
}

/// The value side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Var(VarExpr),
    Const(Value),
}

/// A single, optionally negated, operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub negate: bool,
    pub operand: Operand,
}

/// Comparison operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        })
    }
}

/// A binary comparison between two operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: CmpOp,
    pub left: Cond,
    pub right: Cond,
}

/// Boolean combinators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// An n-ary boolean expression.
///
/// Holds `operators.len() + 1` operands (or a single operand without
/// operators).  Operators are applied strictly left to right after every
/// operand was reduced to a boolean.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub negate: bool,
    pub operators: Vec<BoolOp>,
    pub operands: Vec<CondExpr>,
}

/// One operand of a [`Conditional`].
#[derive(Debug, Clone, PartialEq)]
pub enum CondExpr {
    Cond(Cond),
    Comparison(Comparison),
    Conditional(Conditional),
}

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Template text, emitted verbatim.
    Text(String),
    /// A variable tag; `raw` disables escaping.
    Variable { expr: VarExpr, raw: bool },
    /// A section (`{{#name}}`) or conditional (`{{?if ...}}`) block.
    Section(Section),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub condition: Option<Conditional>,
    pub body: Vec<Node>,
    pub else_body: Vec<Node>,
    pub lineno: usize,
}

impl Section {
    /// Returns `true` for `{{?if}}` blocks.
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}
