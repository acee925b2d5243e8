use super::errors::CompileError;
use crate::runtime::{line_and_column, nth_line, Location};

/// Locate an error in the grammar source
///
/// Errors located at the very end of the source (or inside a multi-byte character) are reported on the
/// last position that has a location.
fn locate(source: &str, pos: usize) -> Location {
    let mut pos = pos.min(source.len());

    loop {
        if let Some(location) = line_and_column(source, pos) {
            return location;
        }

        if pos == 0 {
            return Location::new(1, 1);
        }

        pos -= 1;
    }
}

/// Format a compilation error on a single line, the way compilers do (`file:line:col: error: message`)
pub fn format_compile_error(file: &str, source: &str, err: &CompileError) -> String {
    let location = locate(source, err.pos());
    format!("{}:{}: error: {}", file, location, err)
}

/// Format in a human-readable way a compilation error, showing the offending line of the grammar
pub fn pretty_format_compile_error(source: &str, err: &CompileError) -> String {
    let location = locate(source, err.pos());
    let gutter = location.line().to_string();
    let padding = " ".repeat(location.column() - 1 + gutter.len() + 3);

    format!(
        "ERROR: At line {}, column {}:\n\n{} | {}\n{}^{}",
        location.line(),
        location.column(),
        gutter,
        nth_line(source, location.line()),
        padding,
        err.to_string()
            .lines()
            .map(|line| format!("\n{}{}", padding, line))
            .collect::<String>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_grammar;

    #[test]
    fn formats_on_a_single_line() {
        let source = "A <- 'a' ;\nB <- A missing ;";
        let err = parse_grammar(source).unwrap_err();

        assert_eq!(
            format_compile_error("test.peg", source, &err),
            "test.peg:2:8: error: rule missing is not defined"
        );
    }

    #[test]
    fn points_at_the_error_column() {
        let source = "A <- 'a' ;\nA <- 'b' ;";
        let err = parse_grammar(source).unwrap_err();

        assert_eq!(
            pretty_format_compile_error(source, &err),
            "ERROR: At line 2, column 1:\n\n2 | A <- 'b' ;\n    ^\n    rule A is defined more than once"
        );
    }

    #[test]
    fn shows_lines_ended_by_any_terminator() {
        let source = "A <- 'a' ;\rA <- 'b' ;";
        let err = parse_grammar(source).unwrap_err();

        assert_eq!(
            pretty_format_compile_error(source, &err),
            "ERROR: At line 2, column 1:\n\n2 | A <- 'b' ;\n    ^\n    rule A is defined more than once"
        );
    }

    #[test]
    fn errors_at_the_end_of_source_are_located() {
        let source = "A <- 'a'";
        let err = parse_grammar(source).unwrap_err();

        assert_eq!(err.pos(), 8);
        assert!(format_compile_error("g.peg", source, &err).starts_with("g.peg:1:"));
    }
}
