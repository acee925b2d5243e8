use thiserror::Error;

/// Grammar compilation error
///
/// Every compilation error is fatal and points to a byte offset in the grammar source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{content}")]
pub struct CompileError {
    pos: usize,
    content: CompileErrorContent,
}

impl CompileError {
    /// Create a new compilation error
    pub(crate) fn new(pos: usize, content: CompileErrorContent) -> Self {
        Self { pos, content }
    }

    /// Get the byte offset of the error in the grammar source
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the error's content
    pub fn content(&self) -> &CompileErrorContent {
        &self.content
    }

    /// Get the error's message
    pub fn message(&self) -> String {
        self.content.to_string()
    }
}

/// Content of a [`CompileError`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorContent {
    /// The grammar source could not be parsed, holds the furthest-failure message
    #[error("{0}")]
    Syntax(String),

    #[error("rule {0} is defined more than once")]
    DuplicateRule(String),

    #[error("rule {0} is not defined")]
    UndefinedRule(String),

    #[error("syntax error in action code: {0}")]
    InvalidActionCode(String),

    #[error("syntax error in verbatim code: {0}")]
    InvalidVerbatimCode(String),

    #[error("\"{from}\" or \"{to}\" is not a character")]
    InvalidCharRange { from: String, to: String },

    #[error("U+{0:04X} is not supported")]
    UnsupportedCodePoint(u32),

    #[error("at least one expression is expected to be in sequence with \"*?\" expression")]
    MissingLazyLookahead,

    #[error("entry point {0} conflicts with an item of the generated parser")]
    InvalidEntryPoint(String),

    #[error("variable {0} conflicts with a name of the generated parser")]
    ReservedVariable(String),

    /// A placeholder left by the parser reached code generation, meaning the grammar was not linked
    #[error("{0} was not resolved, the grammar must be linked first")]
    UnresolvedPlaceholder(String),
}
