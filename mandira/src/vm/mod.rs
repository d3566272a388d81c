use std::fmt;

use crate::compiler::ast::{
    Arg, BoolOp, Cond, CondExpr, Conditional, FilterCall, Node, Operand, Section, VarExpr,
};
use crate::environment::Environment;
use crate::error::{Error, ErrorKind};
use crate::output::Output;
use crate::value::{ops, Value, ValueRepr};

pub(crate) use crate::vm::context::{Context, Frame};

mod context;

/// Walks a node tree and writes the rendered text.
pub(crate) struct Vm<'env> {
    env: &'env Environment,
}

impl<'env> Vm<'env> {
    pub fn new(env: &'env Environment) -> Vm<'env> {
        Vm { env }
    }

    /// Renders nodes against the given context.
    ///
    /// Only failures of the underlying writer are reported.  Lookup and
    /// filter failures degrade to empty text for the affected expression.
    pub fn render(&self, nodes: &[Node], ctx: &mut Context, out: &mut Output) -> fmt::Result {
        for node in nodes {
            match node {
                Node::Text(text) => ok!(out.write_str(text)),
                Node::Variable { expr, raw } => {
                    if let Some(value) = self.eval_var(expr, ctx) {
                        let s = match value.as_str() {
                            Some(s) => std::borrow::Cow::Borrowed(s),
                            None => std::borrow::Cow::Owned(value.to_string()),
                        };
                        if *raw {
                            ok!(out.write_str(&s));
                        } else {
                            ok!(out.write_escaped(&s));
                        }
                    }
                }
                Node::Section(section) => ok!(self.render_section(section, ctx, out)),
            }
        }
        Ok(())
    }

    fn render_section(&self, section: &Section, ctx: &mut Context, out: &mut Output) -> fmt::Result {
        if let Some(ref condition) = section.condition {
            return if self.eval_conditional(condition, ctx) {
                self.render(&section.body, ctx, out)
            } else {
                self.render(&section.else_body, ctx, out)
            };
        }

        let value = match ctx.load(&section.name) {
            Some(value) if !value.is_falsy() => value,
            _ => {
                trace!(section = %section.name, "section skipped");
                return Ok(());
            }
        };

        match value.0 {
            ValueRepr::Seq(ref items) => {
                for (idx, item) in items.iter().enumerate() {
                    ctx.push_frame(Frame::new_item(item.clone(), idx));
                    let rv = self.render(&section.body, ctx, out);
                    ctx.pop_frame();
                    ok!(rv);
                }
                Ok(())
            }
            ValueRepr::Map(_) | ValueRepr::Object(_) => {
                ctx.push_frame(Frame::new(value.clone()));
                let rv = self.render(&section.body, ctx, out);
                ctx.pop_frame();
                rv
            }
            _ => self.render(&section.body, ctx, out),
        }
    }

    /// Evaluates a lookup and its filter chain.
    ///
    /// Returns `None` if the name does not resolve or any filter fails.
    fn eval_var(&self, expr: &VarExpr, ctx: &Context) -> Option<Value> {
        let mut value = match ctx.load(&expr.lookup.name) {
            Some(value) => value,
            None => {
                debug!(name = %expr.lookup.name, "unresolved name");
                return None;
            }
        };
        for call in &expr.filters {
            value = match self.apply_filter(call, value, ctx) {
                Ok(rv) => rv,
                Err(_err) => {
                    debug!(filter = %call.name, error = %_err, "filter failed");
                    return None;
                }
            };
        }
        Some(value)
    }

    fn apply_filter(&self, call: &FilterCall, value: Value, ctx: &Context) -> Result<Value, Error> {
        let filter = ok!(self.env.get_filter(&call.name).ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownFilter,
                format!("filter {} is unknown", call.name),
            )
        }));
        let mut args = Vec::with_capacity(call.args.len() + 1);
        args.push(value);
        for arg in &call.args {
            args.push(match arg {
                Arg::Const(value) => value.clone(),
                Arg::Lookup(lookup) => ctx.load(&lookup.name).unwrap_or_else(|| {
                    trace!(name = %lookup.name, "unresolved filter argument");
                    Value::NONE
                }),
            });
        }
        filter.apply_to(&args)
    }

    fn eval_operand(&self, operand: &Operand, ctx: &Context) -> Option<Value> {
        match operand {
            Operand::Var(expr) => self.eval_var(expr, ctx),
            Operand::Const(value) => Some(value.clone()),
        }
    }

    fn eval_cond(&self, cond: &Cond, ctx: &Context) -> bool {
        let truthy = self
            .eval_operand(&cond.operand, ctx)
            .map_or(false, |value| value.is_true());
        truthy != cond.negate
    }

    fn eval_cond_expr(&self, expr: &CondExpr, ctx: &Context) -> bool {
        match expr {
            CondExpr::Cond(cond) => self.eval_cond(cond, ctx),
            CondExpr::Comparison(cmp) => {
                let left = self.eval_operand(&cmp.left.operand, ctx);
                let right = self.eval_operand(&cmp.right.operand, ctx);
                match (left, right) {
                    (Some(left), Some(right)) => ops::compare(cmp.op, &left, &right),
                    _ => false,
                }
            }
            CondExpr::Conditional(cond) => self.eval_conditional(cond, ctx),
        }
    }

    /// Reduces every operand to a boolean first and then folds the
    /// operators strictly from left to right.
    fn eval_conditional(&self, cond: &Conditional, ctx: &Context) -> bool {
        let results: Vec<bool> = cond
            .operands
            .iter()
            .map(|expr| self.eval_cond_expr(expr, ctx))
            .collect();
        let mut iter = results.into_iter();
        let mut rv = iter.next().unwrap_or(false);
        for (op, value) in cond.operators.iter().zip(iter) {
            rv = match op {
                BoolOp::And => rv && value,
                BoolOp::Or => rv || value,
            };
        }
        rv != cond.negate
    }
}
