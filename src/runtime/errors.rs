use super::diagnostics::SyntaxError;
use super::location::{line_and_column, nth_line};
use thiserror::Error;

/// Error raised by the [runtime](super::execute)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The subject does not match the grammar
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A call was not resolved
    ///
    /// This may only happen with [unlinked grammars](crate::compiler::parse_grammar_nocheck)
    #[error("rule {0} was not resolved, the grammar must be linked first")]
    UnresolvedRule(String),

    /// The requested entry point does not exist or is not marked as one
    #[error("{0} is not an entry point of the grammar")]
    UnknownEntryPoint(String),

    /// An action or a semantic predicate failed
    #[error("action at offset {pos} of the grammar failed: {message}")]
    Action { pos: usize, message: String },

    /// The grammar has no rule to start from
    #[error("grammar has no rules")]
    EmptyGrammar,
}

/// Format in a human-readable way a syntax error, showing the offending line of the subject
pub fn pretty_format_syntax_error(subject: &str, err: &SyntaxError) -> String {
    let location = match line_and_column(subject, err.position()) {
        Some(location) => location,
        None => return format!("ERROR: At offset {}: {}", err.position(), err),
    };

    let line = nth_line(subject, location.line());
    let gutter = location.line().to_string();

    format!(
        "ERROR: At line {}, column {}:\n\n{} | {}\n{}^\n{}{}",
        location.line(),
        location.column(),
        gutter,
        line,
        " ".repeat(location.column() - 1 + gutter.len() + 3),
        " ".repeat(gutter.len() + 3),
        err
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_at_the_failing_column() {
        let err = SyntaxError::new("\"b\" is expected", 6);
        let formatted = pretty_format_syntax_error("first\nsecXnd", &err);

        assert_eq!(
            formatted,
            "ERROR: At line 2, column 1:\n\n2 | secXnd\n    ^\n    \"b\" is expected"
        );
    }

    #[test]
    fn falls_back_to_offset_outside_of_subject() {
        let err = SyntaxError::new("the end is expected", 99);
        assert_eq!(
            pretty_format_syntax_error("abc", &err),
            "ERROR: At offset 99: the end is expected"
        );
    }
}
