use thiserror::Error;

/// Set of expectations that failed at the furthest position reached so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurthestError {
    pos: usize,
    expectations: Vec<String>,
}

impl FurthestError {
    /// Create an error made of a single expectation
    pub fn new(expectation: impl Into<String>, pos: usize) -> Self {
        Self {
            pos,
            expectations: vec![expectation.into()],
        }
    }

    /// Get the position the expectations failed at
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the raw expectations, in the order they were recorded
    pub fn expectations(&self) -> &[String] {
        &self.expectations
    }

    /// Merge two errors located at the same position
    ///
    /// Returns `None` when positions differ, as such errors cannot be merged.
    pub fn or(mut self, other: FurthestError) -> Option<FurthestError> {
        if self.pos != other.pos {
            return None;
        }

        self.expectations.extend(other.expectations);
        Some(self)
    }

    /// Build the human-readable message (`"A, B or C is expected"`)
    pub fn message(&self) -> String {
        let mut unique: Vec<&str> = vec![];

        for expectation in &self.expectations {
            if !unique.contains(&expectation.as_str()) {
                unique.push(expectation);
            }
        }

        let listed = match unique.split_last() {
            None => String::new(),
            Some((last, [])) => last.to_string(),
            Some((last, head)) => format!("{} or {}", head.join(", "), last),
        };

        format!("{} is expected", listed)
    }
}

/// Furthest-failure accumulator, threaded through every matcher of a single parse
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    worst: Option<FurthestError>,
}

impl Diagnostics {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed expectation
    ///
    /// Keeps only the expectations at the maximum position: a further error replaces the current one,
    /// an error at the same position is merged into it, a nearer one is discarded.
    pub fn record(&mut self, expectation: impl Into<String>, pos: usize) {
        let error = FurthestError::new(expectation, pos);

        self.worst = match self.worst.take() {
            None => Some(error),
            Some(worst) if worst.pos > pos => Some(worst),
            Some(worst) if worst.pos == pos => worst.or(error),
            Some(_) => Some(error),
        };
    }

    /// Get the current worst error
    pub fn worst(&self) -> Option<&FurthestError> {
        self.worst.as_ref()
    }

    /// Save the current worst error, to be put back with [`Diagnostics::restore`]
    pub fn snapshot(&self) -> Option<FurthestError> {
        self.worst.clone()
    }

    /// Put back a previously saved worst error
    pub fn restore(&mut self, snapshot: Option<FurthestError>) {
        self.worst = snapshot;
    }

    /// Turn the accumulated failures into the error reported to the caller
    ///
    /// `fallback_pos` is used when nothing was recorded, which only happens when semantic predicates
    /// were the sole reason of the failure.
    pub fn into_error(self, fallback_pos: usize) -> SyntaxError {
        match self.worst {
            Some(worst) => SyntaxError::new(worst.message(), worst.pos),
            None => SyntaxError::new("syntax error", fallback_pos),
        }
    }
}

/// Error returned when an input does not match a grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    message: String,
    position: usize,
}

impl SyntaxError {
    /// Create a new syntax error
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Get the error's message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the byte offset the error is located at
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Description of a single expected character
pub fn displayed_char(c: char) -> String {
    let code = c as u32;

    match code {
        0x00..=0x1F | 0x2028 | 0x2029 => format!("U+{:04X}", code),
        0x20..=0x7F => format!("\"{}\"", c),
        _ => format!("\"{} (U+{:04X})\"", c, code),
    }
}

/// Description of an expected string
pub fn displayed(text: &str) -> String {
    let mut chars = text.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) => displayed_char(c),
        _ => format!("\"{}\"", text),
    }
}

/// Description of an expected character range
pub fn displayed_range(from: char, to: char) -> String {
    format!("{}...{}", displayed_char(from), displayed_char(to))
}

/// Expectation recorded when any character was required
pub const EXPECTED_ANY_CHAR: &str = "a character";

/// Expectation recorded when the end of input was required
pub const EXPECTED_END: &str = "the end";

/// Expectation recorded when the beginning of input was required
pub const EXPECTED_BEGINNING: &str = "the beginning";

/// Expectation recorded when a negative predicate's expression matched
pub const EXPECTED_DIFFERENT: &str = "different expression";

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('a', "\"a\"")]
    #[case(' ', "\" \"")]
    #[case('\u{7F}', "\"\u{7F}\"")]
    #[case('\n', "U+000A")]
    #[case('\0', "U+0000")]
    #[case('\u{2028}', "U+2028")]
    #[case('é', "\"é (U+00E9)\"")]
    #[case('←', "\"← (U+2190)\"")]
    fn displays_single_characters(#[case] c: char, #[case] expected: &str) {
        assert_eq!(displayed_char(c), expected);
        assert_eq!(displayed(&c.to_string()), expected);
    }

    #[test]
    fn displays_strings_and_ranges() {
        assert_eq!(displayed("<-"), "\"<-\"");
        assert_eq!(displayed(""), "\"\"");
        assert_eq!(displayed_range('0', '9'), "\"0\"...\"9\"");
    }

    #[test]
    fn further_error_replaces_nearer_one() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record("\"a\"", 3);
        diagnostics.record("\"b\"", 5);
        diagnostics.record("\"c\"", 4);

        let worst = diagnostics.worst().unwrap();
        assert_eq!(worst.pos(), 5);
        assert_eq!(worst.expectations(), ["\"b\""]);
    }

    #[test]
    fn errors_at_same_position_are_merged_without_duplicates() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record("digit", 2);
        diagnostics.record("letter", 2);
        diagnostics.record("digit", 2);

        let error = diagnostics.into_error(0);
        assert_eq!(error.message(), "digit or letter is expected");
        assert_eq!(error.position(), 2);
    }

    #[test]
    fn message_lists_every_expectation() {
        let error = FurthestError::new("A", 0)
            .or(FurthestError::new("B", 0))
            .and_then(|error| error.or(FurthestError::new("C", 0)))
            .unwrap();

        assert_eq!(error.message(), "A, B or C is expected");
        assert_eq!(FurthestError::new("A", 0).message(), "A is expected");
    }

    #[test]
    fn errors_at_different_positions_cannot_be_merged() {
        assert!(FurthestError::new("A", 0).or(FurthestError::new("B", 1)).is_none());
    }

    #[test]
    fn snapshot_restores_previous_worst_error() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record("\"x\"", 1);
        let saved = diagnostics.snapshot();

        diagnostics.record("\"y\"", 8);
        diagnostics.restore(saved);

        assert_eq!(diagnostics.worst().map(FurthestError::pos), Some(1));
    }

    #[test]
    fn empty_diagnostics_fall_back_to_generic_error() {
        let error = Diagnostics::new().into_error(4);
        assert_eq!(error.message(), "syntax error");
        assert_eq!(error.position(), 4);
    }
}
