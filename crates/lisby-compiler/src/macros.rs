use lisby_core::{Node, Span};

use crate::error::SyntaxError;

/// A user-defined macro recorded by `defmacro`: a name, formal parameters,
/// and an unevaluated template body. Expansion substitutes parameter
/// occurrences with argument *nodes* (not their evaluated values) and
/// compiles the result inline — there is no runtime representation.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Node>,
}

impl Macro {
    /// Expands a call `(name args...)` into a fresh copy of the body with
    /// parameters substituted. Each call gets an independent deep clone of
    /// the template so one expansion can never contaminate another.
    pub fn expand(&self, args: &[Node], call_span: Span) -> Result<Vec<Node>, SyntaxError> {
        if args.len() != self.params.len() {
            return Err(SyntaxError::MacroArity {
                name: self.name.clone(),
                expected: self.params.len(),
                got: args.len(),
                span: call_span,
            });
        }
        Ok(self.body.iter().map(|n| substitute(n, &self.params, args, 0)).collect())
    }
}

/// Walks `node`, replacing any `Symbol` matching a parameter name with its
/// argument node — but only at quotation level 0. `Quasiquoted`
/// increments the level on the way in; `Unquoted` decrements it, so an
/// `unquote` nested inside a quasiquoted macro template still substitutes.
fn substitute(node: &Node, params: &[String], args: &[Node], level: i32) -> Node {
    match node {
        Node::Symbol(name, span) => {
            if level <= 0 {
                if let Some(i) = params.iter().position(|p| p == name) {
                    return args[i].clone();
                }
            }
            Node::Symbol(name.clone(), *span)
        }
        Node::Application { applier, args: call_args, span } => Node::Application {
            applier: Box::new(substitute(applier, params, args, level)),
            args: call_args.iter().map(|a| substitute(a, params, args, level)).collect(),
            span: *span,
        },
        Node::Quoted(inner, span) => {
            Node::Quoted(Box::new(substitute(inner, params, args, level)), *span)
        }
        Node::Quasiquoted(inner, span) => {
            Node::Quasiquoted(Box::new(substitute(inner, params, args, level + 1)), *span)
        }
        Node::Unquoted(inner, span) => {
            Node::Unquoted(Box::new(substitute(inner, params, args, level - 1)), *span)
        }
        atom => atom.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisby_core::Span;

    fn sym(s: &str) -> Node {
        Node::Symbol(s.to_string(), Span::new(1, 1))
    }

    #[test]
    fn substitutes_param_at_level_zero() {
        let m = Macro {
            name: "mul".into(),
            params: vec!["a".into(), "b".into()],
            body: vec![Node::Application {
                applier: Box::new(sym("*")),
                args: vec![sym("a"), sym("b")],
                span: Span::new(1, 1),
            }],
        };
        let expanded = m.expand(&[Node::Int(10, Span::new(1, 1)), Node::Int(7, Span::new(1, 1))], Span::new(1, 1)).unwrap();
        assert_eq!(expanded.len(), 1);
        if let Node::Application { args, .. } = &expanded[0] {
            assert!(matches!(args[0], Node::Int(10, _)));
            assert!(matches!(args[1], Node::Int(7, _)));
        } else {
            panic!("expected application");
        }
    }

    #[test]
    fn does_not_substitute_inside_quasiquote_without_unquote() {
        let m = Macro {
            name: "keep".into(),
            params: vec!["a".into()],
            body: vec![Node::Quasiquoted(Box::new(sym("a")), Span::new(1, 1))],
        };
        let expanded = m.expand(&[Node::Int(99, Span::new(1, 1))], Span::new(1, 1)).unwrap();
        if let Node::Quasiquoted(inner, _) = &expanded[0] {
            assert!(matches!(**inner, Node::Symbol(ref s, _) if s == "a"));
        } else {
            panic!("expected quasiquoted");
        }
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let m = Macro { name: "f".into(), params: vec!["a".into()], body: vec![] };
        assert!(m.expand(&[], Span::new(1, 1)).is_err());
    }
}
