//! Grammar syntax tree, produced by the [bootstrap parser](super::parse_grammar_nocheck) and completed by
//! the [linker](super::link).

/// Identifier of a rule, index in [`Grammar::rules`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    /// Get the index of the rule
    pub fn index(self) -> usize {
        self.0
    }
}

/// Opaque handle to a fragment of Rust source code stored in the grammar's side table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnippetId(pub(crate) usize);

/// Fragment of Rust source code (action, semantic predicate or verbatim item)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    code: String,
    pos: usize,
}

impl Snippet {
    /// Create a new snippet located at `pos` in the grammar source
    pub fn new(code: impl Into<String>, pos: usize) -> Self {
        Self {
            code: code.into(),
            pos,
        }
    }

    /// Get the snippet's code, without the surrounding braces
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the position of the snippet in the grammar source
    pub fn pos(&self) -> usize {
        self.pos
    }
}

/// Top-level item of a grammar, kept in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    /// Rule declaration
    Rule(RuleId),

    /// Code copied as-is into the generated output
    Verbatim(SnippetId),
}

/// A compiled grammar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    pub(crate) items: Vec<Item>,
    pub(crate) rules: Vec<RuleDecl>,
    pub(crate) snippets: Vec<Snippet>,
}

impl Grammar {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snippet and get its handle
    pub fn add_snippet(&mut self, snippet: Snippet) -> SnippetId {
        self.snippets.push(snippet);
        SnippetId(self.snippets.len() - 1)
    }

    /// Add a rule at the end of the grammar
    ///
    /// The first rule added is always an entry point.
    pub fn add_rule(&mut self, mut rule: RuleDecl) -> RuleId {
        if self.rules.is_empty() {
            rule.is_entry_point = true;
        }

        let id = RuleId(self.rules.len());
        self.rules.push(rule);
        self.items.push(Item::Rule(id));
        id
    }

    /// Add a verbatim code item at the end of the grammar
    pub fn add_verbatim(&mut self, snippet: Snippet) -> SnippetId {
        let id = self.add_snippet(snippet);
        self.items.push(Item::Verbatim(id));
        id
    }

    /// Get the grammar's items, in source order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Get all rules, in source order
    pub fn rules(&self) -> &[RuleDecl] {
        &self.rules
    }

    /// Get a rule from its identifier
    pub fn rule(&self, id: RuleId) -> &RuleDecl {
        &self.rules[id.0]
    }

    /// Find a rule by name
    pub fn find_rule(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .map(RuleId)
    }

    /// Get the default entry point, which is the first rule
    pub fn default_rule(&self) -> Option<RuleId> {
        if self.rules.is_empty() {
            None
        } else {
            Some(RuleId(0))
        }
    }

    /// Get a snippet from its handle
    pub fn snippet(&self, id: SnippetId) -> &Snippet {
        &self.snippets[id.0]
    }
}

/// Rule declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDecl {
    pub(crate) name: String,
    pub(crate) pos: usize,
    pub(crate) is_entry_point: bool,
    pub(crate) exported: bool,
    pub(crate) annotation: Option<String>,
    pub(crate) body: Expr,
    pub(crate) callable: Option<String>,
}

impl RuleDecl {
    /// Create a new rule declared at `pos`
    pub fn new(name: impl Into<String>, pos: usize, body: Expr) -> Self {
        Self {
            name: name.into(),
            pos,
            is_entry_point: false,
            exported: false,
            annotation: None,
            body,
            callable: None,
        }
    }

    /// Mark the rule as an entry point with its own public function (`name() <- ...`)
    pub fn exported(mut self) -> Self {
        self.is_entry_point = true;
        self.exported = true;
        self
    }

    /// Attach the free-form annotation written between the rule's name and its arrow
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Get the rule's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the position of the rule's header in the grammar source
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Can the rule be used to start a parse?
    pub fn is_entry_point(&self) -> bool {
        self.is_entry_point
    }

    /// Does the rule get a public function named after it?
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Get the rule's annotation
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Get the rule's body
    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// Get the internal callable name assigned by the linker
    pub fn callable(&self) -> Option<&str> {
        self.callable.as_deref()
    }
}

/// Parsing expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Exact string (`'abc'`, `"abc"`, `U+0041`)
    Literal(String),

    /// Single character in an inclusive range (`'a'...'z'`)
    CharRange(char, char),

    /// Any single character (`char`)
    AnyChar,

    /// Beginning of input (`^`)
    StartAnchor,

    /// End of input (`$`)
    EndAnchor,

    /// Current position (`@`)
    PositionMark,

    /// Move back to a captured position (`@=var`)
    PositionRestore(String),

    /// Call to another rule
    Call(RuleRef),

    /// Expressions matched one after the other
    Sequence(Vec<Expr>),

    /// Ordered choice (`a / b`)
    Choice(Vec<Expr>),

    /// Repetition (`*`, `+`, `?`, `*?`)
    Repeat { kind: RepeatKind, inner: Box<Expr> },

    /// Syntactic predicate (`&e`, `!e`)
    Predicate { positive: bool, inner: Box<Expr> },

    /// Boolean code evaluated without consuming input (`&{ ... }`)
    SemanticPredicate(SnippetId),

    /// Bind or append the inner expression's value to a variable (`e :var`, `e :+var`)
    Capture {
        mode: CaptureMode,
        var: String,
        inner: Box<Expr>,
    },

    /// Bind or append the text consumed by the inner expression (`< e > :var`)
    TextCapture {
        mode: CaptureMode,
        var: String,
        inner: Box<Expr>,
    },

    /// Code executed when reached (`{ ... }`)
    Action(SnippetId),
}

impl Expr {
    /// Build a sequence, collapsing the single-item case
    pub fn sequence(mut items: Vec<Expr>) -> Expr {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Sequence(items)
        }
    }

    /// Build a choice, collapsing the single-alternative case
    pub fn choice(mut alternatives: Vec<Expr>) -> Expr {
        if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Expr::Choice(alternatives)
        }
    }

    /// Build an unresolved call to a rule
    pub fn call(name: impl Into<String>, pos: usize) -> Expr {
        Expr::Call(RuleRef {
            name: name.into(),
            pos,
            target: None,
        })
    }

    /// Build a repetition
    pub fn repeat(kind: RepeatKind, inner: Expr) -> Expr {
        Expr::Repeat {
            kind,
            inner: Box::new(inner),
        }
    }

    /// Get the direct sub-expressions
    ///
    /// The follow of a lazy repetition is included once it was spliced by the linker.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Sequence(items) | Expr::Choice(items) => items.iter().collect(),
            Expr::Repeat { kind, inner } => match kind {
                RepeatKind::LazyUntil(Lookahead {
                    follow: Some(follow),
                    ..
                }) => vec![&**inner, &**follow],
                _ => vec![&**inner],
            },
            Expr::Predicate { inner, .. }
            | Expr::Capture { inner, .. }
            | Expr::TextCapture { inner, .. } => vec![&**inner],
            _ => vec![],
        }
    }

    /// Mutable version of [`Expr::children`]
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Expr::Sequence(items) | Expr::Choice(items) => items.iter_mut().collect(),
            Expr::Repeat { kind, inner } => match kind {
                RepeatKind::LazyUntil(Lookahead {
                    follow: Some(follow),
                    ..
                }) => vec![&mut **inner, &mut **follow],
                _ => vec![&mut **inner],
            },
            Expr::Predicate { inner, .. }
            | Expr::Capture { inner, .. }
            | Expr::TextCapture { inner, .. } => vec![&mut **inner],
            _ => vec![],
        }
    }

    /// Visit the expression and all of its descendants, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);

        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// Reference to a rule from a [call](Expr::Call)
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRef {
    pub(crate) name: String,
    pub(crate) pos: usize,
    pub(crate) target: Option<RuleId>,
}

impl RuleRef {
    /// Get the called rule's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the position of the call in the grammar source
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the called rule, once resolved by the linker
    pub fn target(&self) -> Option<RuleId> {
        self.target
    }
}

/// Repetition model
#[derive(Debug, Clone, PartialEq)]
pub enum RepeatKind {
    /// `e*`
    ZeroOrMore,

    /// `e+`
    OneOrMore,

    /// `e?`
    Optional,

    /// `e*?`, repeats until what follows in the enclosing sequence matches
    LazyUntil(Lookahead),
}

impl RepeatKind {
    /// Get the operator's symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            RepeatKind::ZeroOrMore => "*",
            RepeatKind::OneOrMore => "+",
            RepeatKind::Optional => "?",
            RepeatKind::LazyUntil(_) => "*?",
        }
    }
}

/// Lookahead of a lazy repetition: the rest of the enclosing sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Lookahead {
    pub(crate) pos: usize,
    pub(crate) follow: Option<Box<Expr>>,
}

impl Lookahead {
    /// Create an unresolved lookahead for the `*?` operator located at `pos`
    pub fn unresolved(pos: usize) -> Self {
        Self { pos, follow: None }
    }

    /// Get the position of the `*?` operator
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the spliced follow, once resolved by the linker
    pub fn follow(&self) -> Option<&Expr> {
        self.follow.as_deref()
    }
}

/// How a capture stores its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// `:var`, replaces the variable's value
    Assign,

    /// `:+var` or `:>>var`, appends to the variable's value
    Append,
}

impl CaptureMode {
    /// Get the operator's symbol
    pub fn symbol(self) -> &'static str {
        match self {
            CaptureMode::Assign => ":",
            CaptureMode::Append => ":+",
        }
    }
}
