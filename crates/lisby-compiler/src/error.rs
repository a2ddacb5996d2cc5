use lisby_core::Span;

use crate::lexer::LexError;

/// A malformed form caught by the parser or compiler. Carries the source
/// position of the offending node so the CLI can render a snippet.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyntaxError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("expected {what}, got {got}")]
    Expected { what: &'static str, got: String, span: Span },
    #[error("unexpected end of input")]
    UnexpectedEof { span: Span },
    #[error("application ended abruptly")]
    UnclosedApplication { span: Span },
    #[error("integer literal out of range [-2^63, 2^63)")]
    IntegerOutOfRange { span: Span },
    #[error("`{form}` expects {expected}, got {got} argument(s)")]
    Arity { form: &'static str, expected: &'static str, got: usize, span: Span },
    #[error("`{0}` is not a symbol")]
    NotASymbol(String, Span),
    #[error("`call/cc` requires its argument to be `(lambda (k) body...)`")]
    MalformedCallCC { span: Span },
    #[error("macro `{0}` is already defined")]
    DuplicateMacro(String, Span),
    #[error("`{0}` collides with a special form and cannot be used as a macro name")]
    MacroShadowsSpecialForm(String, Span),
    #[error("macro `{name}` expects {expected} argument(s), got {got}")]
    MacroArity { name: String, expected: usize, got: usize, span: Span },
    #[error("lambda parameter must be a symbol")]
    NonSymbolParameter { span: Span },
    #[error("unknown form `{0}`")]
    UnknownForm(String, Span),
    #[error("`{0}` is not callable in this position")]
    NotApplicable(String, Span),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(_) => Span::new(0, 0),
            SyntaxError::Expected { span, .. }
            | SyntaxError::UnexpectedEof { span }
            | SyntaxError::UnclosedApplication { span }
            | SyntaxError::IntegerOutOfRange { span }
            | SyntaxError::Arity { span, .. }
            | SyntaxError::NotASymbol(_, span)
            | SyntaxError::MalformedCallCC { span }
            | SyntaxError::DuplicateMacro(_, span)
            | SyntaxError::MacroShadowsSpecialForm(_, span)
            | SyntaxError::MacroArity { span, .. }
            | SyntaxError::NonSymbolParameter { span }
            | SyntaxError::UnknownForm(_, span)
            | SyntaxError::NotApplicable(_, span) => *span,
        }
    }
}

/// Renders a [`SyntaxError`] as a human-readable, positioned diagnostic
/// using the same annotation machinery the CLI uses for every other
/// source-level error.
pub fn render(source: &str, filename: &str, err: &SyntaxError) -> String {
    use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

    let span = err.span();
    let offset = byte_offset_of(source, span).unwrap_or(0);
    let end = (offset + 1).min(source.len().max(1));
    let message = err.to_string();
    let snippet = Snippet::source(source)
        .path(filename)
        .annotation(AnnotationKind::Primary.span(offset..end).label(&message));
    let report = vec![Level::ERROR.primary_title(&message).element(snippet)];
    Renderer::styled().render(&report).to_string()
}

fn byte_offset_of(source: &str, span: Span) -> Option<usize> {
    if span.line == 0 {
        return None;
    }
    let mut offset = 0usize;
    for (i, line) in source.split('\n').enumerate() {
        if i as u32 + 1 == span.line {
            return Some(offset + (span.col.saturating_sub(1)) as usize);
        }
        offset += line.len() + 1;
    }
    None
}
