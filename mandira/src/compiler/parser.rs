use std::fmt;

use crate::compiler::ast::{
    Arg, BoolOp, CmpOp, Comparison, Cond, CondExpr, Conditional, FilterCall, LookupExpr, Operand,
    VarExpr,
};
use crate::compiler::lexer::tokenize;
use crate::compiler::tokens::Token;
use crate::error::{Error, ErrorKind};
use crate::value::Value;

const MAX_RECURSION: usize = 150;

fn unexpected<D: fmt::Display>(unexpected: D, expected: &str) -> Error {
    Error::new(
        ErrorKind::SyntaxError,
        format!("unexpected {}, expected {}", unexpected, expected),
    )
}

fn unexpected_eof(expected: &str) -> Error {
    unexpected("end of input", expected)
}

fn syntax_error(msg: &'static str) -> Error {
    Error::new(ErrorKind::SyntaxError, msg)
}

macro_rules! expect_token {
    ($parser:expr, $match:pat => $target:expr, $expectation:expr) => {{
        match $parser.stream.next() {
            Some($match) => $target,
            Some(token) => return Err(unexpected(token, $expectation)),
            None => return Err(unexpected_eof($expectation)),
        }
    }};
}

macro_rules! matches_token {
    ($p:expr, $match:pat) => {
        matches!($p.stream.current(), Some($match))
    };
}

macro_rules! skip_token {
    ($p:expr, $match:pat) => {
        if matches_token!($p, $match) {
            $p.stream.next();
            true
        } else {
            false
        }
    };
}

/// A cursor over a tokenized expression.
struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn new(tokens: Vec<Token<'a>>) -> TokenStream<'a> {
        TokenStream { tokens, pos: 0 }
    }

    /// Advance the stream.
    fn next(&mut self) -> Option<Token<'a>> {
        let rv = self.tokens.get(self.pos).cloned();
        if rv.is_some() {
            self.pos += 1;
        }
        rv
    }

    /// Look at the current token
    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    /// Step back to the previous token.
    fn prev(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

/// The result of parsing a unary term before we know if a comparison
/// operator follows.
enum Unary {
    Cond(Cond),
    Group(Conditional),
}

struct Parser<'a> {
    stream: TokenStream<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Parser<'a> {
        Parser {
            stream: TokenStream::new(tokens),
            depth: 0,
        }
    }

    fn parse_arg(&mut self) -> Result<Arg, Error> {
        Ok(match self.stream.next() {
            Some(Token::Str(s)) => Arg::Const(Value::from(s.into_owned())),
            Some(Token::Int(i)) => Arg::Const(Value::from(i)),
            Some(Token::Float(f)) => Arg::Const(Value::from(f)),
            Some(Token::Word(name)) => Arg::Lookup(LookupExpr { name: name.into() }),
            Some(token) => return Err(unexpected(token, "filter argument")),
            None => return Err(syntax_error("mismatched parentheses in filter call")),
        })
    }

    fn parse_filter_args(&mut self) -> Result<Vec<Arg>, Error> {
        let mut args = Vec::new();
        if skip_token!(self, Token::ParenClose) {
            return Ok(args);
        }
        loop {
            args.push(ok!(self.parse_arg()));
            match self.stream.next() {
                Some(Token::Comma) => {}
                Some(Token::ParenClose) => break,
                Some(_) => {
                    self.stream.prev();
                    return Err(syntax_error("missing comma between filter arguments"));
                }
                None => return Err(syntax_error("mismatched parentheses in filter call")),
            }
        }
        Ok(args)
    }

    fn parse_filter(&mut self) -> Result<FilterCall, Error> {
        let name = match self.stream.next() {
            Some(Token::Word(name)) => name,
            _ => return Err(syntax_error("missing filter name after `|`")),
        };
        let args = if skip_token!(self, Token::ParenOpen) {
            ok!(self.parse_filter_args())
        } else {
            Vec::new()
        };
        Ok(FilterCall {
            name: name.into(),
            args,
        })
    }

    fn parse_var_expr(&mut self) -> Result<VarExpr, Error> {
        let name = expect_token!(self, Token::Word(name) => name, "name");
        let mut filters = Vec::new();
        while skip_token!(self, Token::Pipe) {
            filters.push(ok!(self.parse_filter()));
        }
        Ok(VarExpr {
            lookup: LookupExpr { name: name.into() },
            filters,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand, Error> {
        Ok(match self.stream.next() {
            Some(Token::Str(s)) => Operand::Const(Value::from(s.into_owned())),
            Some(Token::Int(i)) => Operand::Const(Value::from(i)),
            Some(Token::Float(f)) => Operand::Const(Value::from(f)),
            Some(Token::Word(_)) => {
                self.stream.prev();
                Operand::Var(ok!(self.parse_var_expr()))
            }
            Some(token) => return Err(unexpected(token, "condition")),
            None => return Err(unexpected_eof("condition")),
        })
    }

    fn parse_unary(&mut self) -> Result<Unary, Error> {
        let mut negate = false;
        while skip_token!(self, Token::Not) {
            negate = !negate;
        }
        if skip_token!(self, Token::ParenOpen) {
            self.depth += 1;
            if self.depth > MAX_RECURSION {
                return Err(syntax_error("condition is nested too deeply"));
            }
            let mut group = ok!(self.parse_conditional());
            if !skip_token!(self, Token::ParenClose) {
                return Err(syntax_error("mismatched parentheses in condition"));
            }
            self.depth -= 1;
            group.negate = negate;
            Ok(Unary::Group(group))
        } else {
            let operand = ok!(self.parse_operand());
            Ok(Unary::Cond(Cond { negate, operand }))
        }
    }

    fn parse_cmp_op(&mut self) -> Option<CmpOp> {
        let op = match self.stream.current() {
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Lte) => CmpOp::Lte,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Gte) => CmpOp::Gte,
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            _ => return None,
        };
        self.stream.next();
        Some(op)
    }

    fn comparison_operand(unary: Unary) -> Result<Cond, Error> {
        match unary {
            Unary::Cond(cond) if cond.negate => Err(syntax_error(
                "`not` cannot be used next to a comparison, use the converse operator",
            )),
            Unary::Cond(cond) => Ok(cond),
            Unary::Group(_) => Err(syntax_error(
                "a parenthesized condition cannot be compared",
            )),
        }
    }

    fn parse_term(&mut self) -> Result<CondExpr, Error> {
        let left = ok!(self.parse_unary());
        let op = match self.parse_cmp_op() {
            Some(op) => op,
            None => {
                return Ok(match left {
                    Unary::Cond(cond) => CondExpr::Cond(cond),
                    Unary::Group(group) => CondExpr::Conditional(group),
                })
            }
        };
        let left = ok!(Self::comparison_operand(left));
        if matches_token!(self, Token::Not) {
            return Err(syntax_error(
                "`not` cannot be used next to a comparison, use the converse operator",
            ));
        }
        let right = ok!(self.parse_unary().and_then(Self::comparison_operand));
        Ok(CondExpr::Comparison(Comparison { op, left, right }))
    }

    fn parse_conditional(&mut self) -> Result<Conditional, Error> {
        let mut operators = Vec::new();
        let mut operands = vec![ok!(self.parse_term())];
        loop {
            let op = match self.stream.current() {
                Some(Token::And) => BoolOp::And,
                Some(Token::Or) => BoolOp::Or,
                _ => break,
            };
            self.stream.next();
            operators.push(op);
            operands.push(ok!(self.parse_term()));
        }
        Ok(Conditional {
            negate: false,
            operators,
            operands,
        })
    }

    fn expect_end(&mut self, expected: &str) -> Result<(), Error> {
        match self.stream.next() {
            None => Ok(()),
            Some(Token::ParenClose) => Err(syntax_error("mismatched parentheses")),
            Some(token) => Err(unexpected(token, expected)),
        }
    }
}

/// Parses the expression of a variable tag (`name|filter(arg)|...`).
pub fn parse_var_expr(source: &str) -> Result<VarExpr, Error> {
    let mut parser = Parser::new(ok!(tokenize(source)));
    let expr = ok!(parser.parse_var_expr());
    ok!(parser.expect_end("`|` or end of expression"));
    Ok(expr)
}

/// Parses the condition of an `?if` tag.
///
/// Comparisons bind tighter than `and`/`or`, which themselves have equal
/// precedence and are applied left to right.
pub fn parse_condition(source: &str) -> Result<Conditional, Error> {
    let mut parser = Parser::new(ok!(tokenize(source)));
    let cond = ok!(parser.parse_conditional());
    ok!(parser.expect_end("`and`, `or` or end of condition"));
    Ok(cond)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> LookupExpr {
        LookupExpr { name: name.into() }
    }

    fn var(name: &str) -> Operand {
        Operand::Var(VarExpr {
            lookup: lookup(name),
            filters: vec![],
        })
    }

    #[test]
    fn test_plain_lookup() {
        let expr = parse_var_expr("hello").unwrap();
        assert_eq!(expr.lookup, lookup("hello"));
        assert!(expr.filters.is_empty());
    }

    #[test]
    fn test_filter_chain_with_args() {
        let expr = parse_var_expr(r#"hello|upper|join(", ", 3.5, someVar)|fake("hi")"#).unwrap();
        assert_eq!(expr.lookup, lookup("hello"));
        let names: Vec<_> = expr.filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["upper", "join", "fake"]);
        assert!(expr.filters[0].args.is_empty());
        assert_eq!(
            expr.filters[1].args,
            vec![
                Arg::Const(Value::from(", ")),
                Arg::Const(Value::from(3.5)),
                Arg::Lookup(lookup("someVar")),
            ]
        );
        assert_eq!(expr.filters[2].args, vec![Arg::Const(Value::from("hi"))]);
    }

    #[test]
    fn test_var_expr_errors() {
        assert!(parse_var_expr("name|").is_err());
        assert!(parse_var_expr("name|(1)").is_err());
        assert!(parse_var_expr("name|index(1").is_err());
        assert!(parse_var_expr("name|join(1 2)").is_err());
        assert!(parse_var_expr("name)").is_err());
        assert!(parse_var_expr("").is_err());
        let err = parse_var_expr("name|").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_comparisons_bind_tighter() {
        let cond = parse_condition(r#"name == "john" or name == "ted""#).unwrap();
        assert_eq!(cond.operators, vec![BoolOp::Or]);
        assert_eq!(cond.operands.len(), 2);
        assert!(matches!(
            cond.operands[0],
            CondExpr::Comparison(Comparison { op: CmpOp::Eq, .. })
        ));
    }

    #[test]
    fn test_flat_operator_list() {
        let cond = parse_condition("a or b and c").unwrap();
        assert_eq!(cond.operators, vec![BoolOp::Or, BoolOp::And]);
        assert_eq!(
            cond.operands,
            vec![
                CondExpr::Cond(Cond {
                    negate: false,
                    operand: var("a")
                }),
                CondExpr::Cond(Cond {
                    negate: false,
                    operand: var("b")
                }),
                CondExpr::Cond(Cond {
                    negate: false,
                    operand: var("c")
                }),
            ]
        );
    }

    #[test]
    fn test_negated_group() {
        let cond = parse_condition("not (a or b) and not c").unwrap();
        match &cond.operands[0] {
            CondExpr::Conditional(group) => {
                assert!(group.negate);
                assert_eq!(group.operators, vec![BoolOp::Or]);
            }
            other => panic!("unexpected operand {:?}", other),
        }
        assert_eq!(
            cond.operands[1],
            CondExpr::Cond(Cond {
                negate: true,
                operand: var("c")
            })
        );
    }

    #[test]
    fn test_not_next_to_comparison() {
        assert!(parse_condition("not a == b").is_err());
        assert!(parse_condition("a == not b").is_err());
        assert!(parse_condition("(a) == b").is_err());
    }

    #[test]
    fn test_condition_errors() {
        assert!(parse_condition("").is_err());
        assert!(parse_condition("(a or b").is_err());
        assert!(parse_condition("a or b)").is_err());
        assert!(parse_condition("a b").is_err());
        assert!(parse_condition("a and").is_err());
    }

    #[test]
    fn test_filters_in_conditions() {
        let cond = parse_condition("name|len > 4").unwrap();
        match &cond.operands[0] {
            CondExpr::Comparison(cmp) => {
                assert_eq!(cmp.op, CmpOp::Gt);
                assert_eq!(cmp.right.operand, Operand::Const(Value::from(4)));
                match &cmp.left.operand {
                    Operand::Var(expr) => assert_eq!(expr.filters[0].name, "len"),
                    other => panic!("unexpected operand {:?}", other),
                }
            }
            other => panic!("unexpected operand {:?}", other),
        }
    }

    #[test]
    fn test_deep_nesting() {
        let source = format!("{}a{}", "(".repeat(200), ")".repeat(200));
        let err = parse_condition(&source).unwrap_err();
        assert_eq!(err.detail(), Some("condition is nested too deeply"));
    }
}
