/// Positionable reader over an UTF-8 input
///
/// Positions are byte offsets. Moving the cursor backwards with [`Cursor::set_position`] is the only
/// way backtracking happens, both in the bootstrap parser and in the [interpreter](super::execute).
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor located at the beginning of the input
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Get the whole input
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Get the current position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to a position previously obtained with [`Cursor::position`]
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(self.input.is_char_boundary(pos));
        self.pos = pos;
    }

    /// Get the input that was not consumed yet
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Is the cursor at the end of the input?
    pub fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    /// Is the cursor at the beginning of the input?
    pub fn at_start(&self) -> bool {
        self.pos == 0
    }

    /// Look at the next character without consuming it
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume a single character, fails at the end of input
    pub fn read_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume exactly the provided string
    ///
    /// The cursor does not move if the input does not start with `expected`.
    pub fn read_exact(&mut self, expected: &str) -> Option<&'a str> {
        if !self.rest().starts_with(expected) {
            return None;
        }

        let read = &self.input[self.pos..self.pos + expected.len()];
        self.pos += expected.len();
        Some(read)
    }

    /// Get the text consumed since `start`
    ///
    /// This is the text-capture primitive: the cursor is conceptually reset to `start` and the same
    /// characters are read again, so it ends up where it was.
    pub fn take_since(&mut self, start: usize) -> &'a str {
        let end = self.pos;
        self.set_position(start);
        let text = &self.input[start..end];
        self.set_position(end);
        text
    }
}
