use std::fmt;

/// Human-readable location in an input, both numbers start at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    line: usize,
    column: usize,
}

impl Location {
    /// Create a new location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Get the line number
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the column number (counted in characters)
    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Get the length of the line terminator the input starts with (0 if there is none)
///
/// `\r\n` counts as a single terminator.
pub fn newline_length(input: &str) -> usize {
    if input.starts_with("\r\n") {
        return 2;
    }

    match input.chars().next() {
        Some(c) if is_newline(c) => c.len_utf8(),
        _ => 0,
    }
}

/// Is a character a line terminator on its own?
pub fn is_newline(c: char) -> bool {
    matches!(
        c,
        '\r' | '\n' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Convert a byte offset into a line and column
///
/// Returns `None` if the offset is past the end of the input or does not fall at the beginning of a
/// character (which includes the middle of a `\r\n` pair).
pub fn line_and_column(input: &str, pos: usize) -> Option<Location> {
    let mut line = 1;
    let mut column = 1;
    let mut current = 0;

    loop {
        if current == pos {
            return Some(Location::new(line, column));
        }

        let rest = &input[current..];

        match newline_length(rest) {
            0 => {
                let c = rest.chars().next()?;
                current += c.len_utf8();
                column += 1;
            }

            len => {
                current += len;
                line += 1;
                column = 1;
            }
        }
    }
}

/// Get the content of a line (starting at 1), without its terminator
///
/// Lines are split the same way [`line_and_column`] counts them. Lines past the end of the input are empty.
pub fn nth_line(input: &str, line: usize) -> &str {
    let mut current_line = 1;
    let mut line_start = 0;
    let mut current = 0;

    while let Some(c) = input[current..].chars().next() {
        match newline_length(&input[current..]) {
            0 => current += c.len_utf8(),

            len => {
                if current_line == line {
                    return &input[line_start..current];
                }

                current += len;
                current_line += 1;
                line_start = current;
            }
        }
    }

    if current_line == line {
        &input[line_start..]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", 0, Some((1, 1)))]
    #[case("abc", 2, Some((1, 3)))]
    #[case("abc", 3, Some((1, 4)))]
    #[case("ab\ncd", 3, Some((2, 1)))]
    #[case("ab\r\ncd", 5, Some((2, 2)))]
    #[case("ab\r\ncd", 3, None)]
    #[case("a\rb\u{2028}c", 6, Some((3, 1)))]
    #[case("é\u{0C}x", 3, Some((2, 1)))]
    #[case("ééx", 4, Some((1, 3)))]
    #[case("abc", 7, None)]
    fn converts_offsets(
        #[case] input: &str,
        #[case] pos: usize,
        #[case] expected: Option<(usize, usize)>,
    ) {
        let location = line_and_column(input, pos).map(|loc| (loc.line(), loc.column()));
        assert_eq!(location, expected);
    }

    #[rstest]
    #[case("ab\ncd", 2, "cd")]
    #[case("ab\r\ncd\r\n", 1, "ab")]
    #[case("ab\rcd", 2, "cd")]
    #[case("a\u{2028}b\u{0C}c", 3, "c")]
    #[case("ab\n", 2, "")]
    #[case("ab", 5, "")]
    fn extracts_lines(#[case] input: &str, #[case] line: usize, #[case] expected: &str) {
        assert_eq!(nth_line(input, line), expected);
    }

    #[test]
    fn displays_as_line_colon_column() {
        assert_eq!(Location::new(4, 12).to_string(), "4:12");
    }
}
