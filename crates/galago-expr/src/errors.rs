use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while parsing candidate-expression source text.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(galago::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Integer literal out of range: {text}")]
    #[diagnostic(code(galago::parse::int_literal))]
    IntLiteral {
        text: String,
        #[label("does not fit in i64")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },
}

impl ParseError {
    pub fn syntax(
        message: impl Into<String>,
        start: usize,
        end: usize,
        source: &str,
        filename: &str,
    ) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: (start, end.saturating_sub(start)).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        }
    }
}

/// Errors produced while evaluating an expression under an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },

    #[error("{operation} expects {expected} operands, found {found}")]
    SortMismatch {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expression evaluates to {found}, expected a boolean")]
    NotBoolean { found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_constructor_builds_span() {
        let err = ParseError::syntax("bad token", 5, 10, "some source code", "cand.inv");
        assert_eq!(err.to_string(), "Syntax error: bad token");
        match &err {
            ParseError::Syntax { span, .. } => {
                assert_eq!(span.offset(), 5);
                assert_eq!(span.len(), 5);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
