use std::borrow::Cow;
use std::fmt;

/// Represents a token in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// A bare word (a name to look up, or a filter name).
    Word(&'a str),
    /// A string literal with escapes resolved.
    Str(Cow<'a, str>),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// `<` operator
    Lt,
    /// `<=` operator
    Lte,
    /// `>` operator
    Gt,
    /// `>=` operator
    Gte,
    /// `==` operator
    Eq,
    /// `!=` operator
    Ne,
    /// The pipe symbol.
    Pipe,
    /// Open Parenthesis
    ParenOpen,
    /// Close Parenthesis
    ParenClose,
    /// The comma operator (`,`)
    Comma,
    /// The `and` keyword.
    And,
    /// The `or` keyword.
    Or,
    /// The `not` keyword.
    Not,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(_) => f.write_str("name"),
            Token::Str(_) => f.write_str("string"),
            Token::Int(_) => f.write_str("integer"),
            Token::Float(_) => f.write_str("float"),
            Token::Lt => f.write_str("`<`"),
            Token::Lte => f.write_str("`<=`"),
            Token::Gt => f.write_str("`>`"),
            Token::Gte => f.write_str("`>=`"),
            Token::Eq => f.write_str("`==`"),
            Token::Ne => f.write_str("`!=`"),
            Token::Pipe => f.write_str("`|`"),
            Token::ParenOpen => f.write_str("`(`"),
            Token::ParenClose => f.write_str("`)`"),
            Token::Comma => f.write_str("`,`"),
            Token::And => f.write_str("`and`"),
            Token::Or => f.write_str("`or`"),
            Token::Not => f.write_str("`not`"),
        }
    }
}
