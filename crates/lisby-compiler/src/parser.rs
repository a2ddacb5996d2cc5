use lisby_core::{Node, Span};

use crate::error::SyntaxError;
use crate::lexer::{Spanned, Token};

const INT_MAX: i128 = 1i128 << 63; // exclusive upper bound
const INT_MIN: i128 = -(1i128 << 63); // inclusive lower bound

/// Recursive-descent parser over an already-lexed token stream. One
/// `Node` tree is produced per top-level form; [`parse`] collects every
/// form in the input into a forest.
struct Parser<'a> {
    toks: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(toks: &'a [Spanned]) -> Self {
        Self { toks, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn cur(&self) -> Option<&Spanned> {
        self.toks.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Spanned> {
        let tok = self.toks.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect_rparen(&mut self, open_span: Span) -> Result<(), SyntaxError> {
        match self.advance() {
            Some(Spanned { token: Token::RParen, .. }) => Ok(()),
            Some(other) => Err(SyntaxError::Expected {
                what: "`)`",
                got: format!("{:?}", other.token),
                span: other.span,
            }),
            None => Err(SyntaxError::UnexpectedEof { span: open_span }),
        }
    }

    fn atom(&mut self) -> Result<Node, SyntaxError> {
        let spanned = self
            .cur()
            .ok_or(SyntaxError::UnexpectedEof { span: Span::new(0, 0) })?
            .clone();
        let span = spanned.span;
        let node = match spanned.token {
            Token::Int(raw) => Node::Int(parse_int(&raw, span)?, span),
            Token::Float(f) => Node::Float(f, span),
            Token::String(s) => Node::String(s, span),
            Token::Symbol(s) => Node::Symbol(s, span),
            Token::True => Node::True(span),
            Token::False => Node::False(span),
            other => {
                return Err(SyntaxError::Expected {
                    what: "an atom",
                    got: format!("{other:?}"),
                    span,
                });
            }
        };
        self.advance();
        Ok(node)
    }

    fn application(&mut self) -> Result<Node, SyntaxError> {
        let open = self.advance().expect("caller checked LParen").span;
        match self.cur() {
            Some(Spanned { token: Token::RParen, .. }) => {
                self.advance();
                return Ok(Node::Unit(open));
            }
            None => return Err(SyntaxError::UnexpectedEof { span: open }),
            _ => {}
        }
        let applier = self.expr()?;
        let mut args = Vec::new();
        loop {
            match self.cur() {
                Some(Spanned { token: Token::RParen, .. }) => break,
                Some(_) => args.push(self.expr()?),
                None => return Err(SyntaxError::UnclosedApplication { span: open }),
            }
        }
        self.expect_rparen(open)?;
        Ok(Node::Application { applier: Box::new(applier), args, span: open })
    }

    fn quoted(&mut self) -> Result<Node, SyntaxError> {
        let span = self.advance().expect("caller checked Quote").span;
        Ok(Node::Quoted(Box::new(self.expr()?), span))
    }

    fn quasiquoted(&mut self) -> Result<Node, SyntaxError> {
        let span = self.advance().expect("caller checked Quasiquote").span;
        Ok(Node::Quasiquoted(Box::new(self.expr()?), span))
    }

    fn unquoted(&mut self) -> Result<Node, SyntaxError> {
        let span = self.advance().expect("caller checked Unquote").span;
        Ok(Node::Unquoted(Box::new(self.expr()?), span))
    }

    fn expr(&mut self) -> Result<Node, SyntaxError> {
        match self.cur() {
            Some(Spanned { token: Token::LParen, .. }) => self.application(),
            Some(Spanned { token: Token::Quote, .. }) => self.quoted(),
            Some(Spanned { token: Token::Quasiquote, .. }) => self.quasiquoted(),
            Some(Spanned { token: Token::Unquote, .. }) => self.unquoted(),
            Some(_) => self.atom(),
            None => Err(SyntaxError::UnexpectedEof { span: Span::new(0, 0) }),
        }
    }
}

fn parse_int(raw: &str, span: Span) -> Result<i64, SyntaxError> {
    let v: i128 = raw.parse().map_err(|_| SyntaxError::IntegerOutOfRange { span })?;
    if v < INT_MIN || v >= INT_MAX {
        return Err(SyntaxError::IntegerOutOfRange { span });
    }
    Ok(v as i64)
}

/// Parses every top-level form in `toks` into a forest of nodes.
pub fn parse(toks: &[Spanned]) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser::new(toks);
    let mut forest = Vec::new();
    while !parser.at_end() {
        forest.push(parser.expr()?);
    }
    Ok(forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Vec<Node> {
        parse(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_nested_application() {
        let forest = parse_src("(+ 10 (* 2 (/ 9 3)))");
        assert_eq!(forest.len(), 1);
        assert!(forest[0].is_application());
    }

    #[test]
    fn empty_application_is_unit() {
        let forest = parse_src("()");
        assert!(matches!(forest[0], Node::Unit(_)));
    }

    #[test]
    fn quote_family_nests_via_expr() {
        let forest = parse_src("''(1 '2 ''x)");
        assert!(matches!(forest[0], Node::Quoted(..)));
    }

    #[test]
    fn rejects_integer_at_upper_bound() {
        let src = format!("{}", 1i128 << 63);
        let toks = lex(&src).unwrap();
        assert!(matches!(parse(&toks), Err(SyntaxError::IntegerOutOfRange { .. })));
    }

    #[test]
    fn accepts_i64_min_as_lower_bound_inclusive() {
        let src = format!("{}", i64::MIN);
        let toks = lex(&src).unwrap();
        assert!(parse(&toks).is_ok());
    }

    #[test]
    fn unclosed_application_is_syntax_error() {
        let toks = lex("(+ 1 2").unwrap_err();
        let _ = toks; // lexing itself rejects unbalanced parens
    }
}
