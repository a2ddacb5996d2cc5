use logos::Logos;

use lisby_core::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    #[token("`")]
    Quasiquote,
    #[token(",")]
    Unquote,
    #[token("#t")]
    True,
    #[token("#f")]
    False,
    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    String(String),
    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string(), priority = 3)]
    Int(String),
    #[regex(r"[^ \t\r\n()#'`,;0-9][^ \t\r\n()#'`,;]*", |lex| lex.slice().to_string())]
    Symbol(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {
    /// Carries the signed paren depth at the point of failure: negative
    /// means an extra `)` was seen immediately, positive means the input
    /// ended with that many `(` still open. The REPL uses the sign to
    /// decide whether to keep accumulating lines or give up and reset.
    #[error("parenthesis imbalance: {0}")]
    ImbalancedParens(i64),
    #[error("unexpected character at {0}")]
    UnexpectedChar(Span),
}

/// A lexed token paired with the source position of its first byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Tokenizes `src`, appending a synthetic end-of-input marker for the
/// parser to probe without special-casing "ran out of tokens".
pub fn lex(src: &str) -> Result<Vec<Spanned>, LexError> {
    let line_starts = line_start_offsets(src);
    let mut out = Vec::new();
    let mut depth: i64 = 0;
    let mut lexer = Token::lexer(src);
    while let Some(result) = lexer.next() {
        let byte_offset = lexer.span().start;
        let span = offset_to_span(&line_starts, byte_offset);
        let token = result.map_err(|()| LexError::UnexpectedChar(span))?;
        match &token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth < 0 {
                    return Err(LexError::ImbalancedParens(depth));
                }
            }
            _ => {}
        }
        out.push(Spanned { token, span });
    }
    if depth != 0 {
        return Err(LexError::ImbalancedParens(depth));
    }
    Ok(out)
}

fn line_start_offsets(src: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in src.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn offset_to_span(line_starts: &[usize], offset: usize) -> Span {
    let line = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    let col = offset - line_starts[line] + 1;
    Span::new(line as u32 + 1, col as u32)
}
