use crate::compiler::ast::{Node, Section};
use crate::compiler::parser::{parse_condition, parse_var_expr};
use crate::error::{Error, ErrorKind};

const OPEN_TAG: &str = "{{";
const CLOSE_TAG: &str = "}}";
const RAW_CLOSE_TAG: &str = "}}}";

fn parse_error(msg: impl Into<std::borrow::Cow<'static, str>>, lineno: usize) -> Error {
    Error::new(ErrorKind::ParseError, msg).at_line(lineno)
}

/// The section that is currently being filled.
struct OpenSection<'s> {
    name: &'s str,
    lineno: usize,
}

/// Nodes collected for one nesting level.
#[derive(Default)]
struct Block {
    body: Vec<Node>,
    else_body: Vec<Node>,
    in_else: bool,
}

impl Block {
    fn push(&mut self, node: Node) {
        if self.in_else {
            self.else_body.push(node);
        } else {
            self.body.push(node);
        }
    }
}

/// Splits template source into text and tags and builds the node tree.
struct Scanner<'s> {
    source: &'s str,
    pos: usize,
    lineno: usize,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Scanner<'s> {
        Scanner {
            source,
            pos: 0,
            lineno: 1,
        }
    }

    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    /// Reads up to `delim` and returns the text before it.  The cursor is
    /// moved past the delimiter.  At end of input nothing is consumed.
    fn read_until(&mut self, delim: &str) -> Option<&'s str> {
        let rest = self.rest();
        let idx = some!(rest.find(delim));
        let consumed = &rest[..idx + delim.len()];
        self.lineno += consumed.bytes().filter(|&c| c == b'\n').count();
        self.pos += consumed.len();
        Some(&rest[..idx])
    }

    fn skip_newline(&mut self) {
        let rest = self.rest();
        if rest.starts_with('\n') {
            self.pos += 1;
            self.lineno += 1;
        } else if rest.starts_with("\r\n") {
            self.pos += 2;
            self.lineno += 1;
        }
    }

    fn parse_block(&mut self, open: Option<&OpenSection<'s>>) -> Result<Block, Error> {
        let mut block = Block::default();
        loop {
            let text = match self.read_until(OPEN_TAG) {
                Some(text) => text,
                None => {
                    let text = self.rest();
                    if let Some(open) = open {
                        return Err(parse_error(
                            format!("{} has no closing tag", open.name),
                            open.lineno,
                        ));
                    }
                    if !text.is_empty() {
                        block.push(Node::Text(text.into()));
                    }
                    self.pos = self.source.len();
                    return Ok(block);
                }
            };
            if !text.is_empty() {
                block.push(Node::Text(text.into()));
            }

            let tag_lineno = self.lineno;
            let raw = self.rest().starts_with('{');
            let inner = match self.read_until(if raw { RAW_CLOSE_TAG } else { CLOSE_TAG }) {
                Some(inner) => inner,
                None => return Err(parse_error("unmatched open tag", tag_lineno)),
            };

            if raw {
                let expr = ok!(parse_var_expr(inner[1..].trim()).map_err(|e| e.at_line(tag_lineno)));
                block.push(Node::Variable { expr, raw: true });
                continue;
            }

            let tag = inner.trim();
            match tag.as_bytes().first() {
                None => return Err(parse_error("empty tag", tag_lineno)),
                Some(b'!') => {}
                Some(b'#') => {
                    let name = tag[1..].trim();
                    if name.is_empty() {
                        return Err(parse_error("section tag without a name", tag_lineno));
                    }
                    self.skip_newline();
                    let section = ok!(self.parse_section(name, tag_lineno, None));
                    block.push(Node::Section(section));
                }
                Some(b'?') => {
                    if tag == "?else" {
                        if open.is_none() {
                            return Err(parse_error("else tag outside of a section", tag_lineno));
                        }
                        block.in_else = true;
                    } else if let Some(expr) = tag
                        .strip_prefix("?if")
                        .filter(|expr| expr.is_empty() || expr.starts_with(char::is_whitespace))
                    {
                        let condition =
                            ok!(parse_condition(expr.trim()).map_err(|e| e.at_line(tag_lineno)));
                        let section = ok!(self.parse_section("if", tag_lineno, Some(condition)));
                        block.push(Node::Section(section));
                    } else {
                        return Err(parse_error(
                            format!("invalid conditional tag: {}", tag),
                            tag_lineno,
                        ));
                    }
                }
                Some(b'/') => {
                    let name = tag[1..].trim();
                    return match open {
                        None => Err(parse_error("unmatched close tag", tag_lineno)),
                        Some(open) if open.name != name => Err(parse_error(
                            format!("interleaved closing tag: {}", name),
                            tag_lineno,
                        )),
                        Some(_) => Ok(block),
                    };
                }
                Some(b'{') if tag.len() > 1 && tag.ends_with('}') => {
                    let expr = ok!(parse_var_expr(tag[1..tag.len() - 1].trim())
                        .map_err(|e| e.at_line(tag_lineno)));
                    block.push(Node::Variable { expr, raw: true });
                }
                Some(_) => {
                    let expr = ok!(parse_var_expr(tag).map_err(|e| e.at_line(tag_lineno)));
                    block.push(Node::Variable { expr, raw: false });
                }
            }
        }
    }

    fn parse_section(
        &mut self,
        name: &'s str,
        lineno: usize,
        condition: Option<crate::compiler::ast::Conditional>,
    ) -> Result<Section, Error> {
        let block = ok!(self.parse_block(Some(&OpenSection { name, lineno })));
        Ok(Section {
            name: name.into(),
            condition,
            body: block.body,
            else_body: block.else_body,
            lineno,
        })
    }
}

/// Parses template source into a list of nodes.
///
/// Tags are delimited by `{{` and `}}`.  Parsing stops at the first error;
/// there is no partial result.
pub fn parse(source: &str) -> Result<Vec<Node>, Error> {
    let mut scanner = Scanner::new(source);
    scanner.parse_block(None).map(|block| block.body)
}
