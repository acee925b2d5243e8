use super::data::*;
use super::errors::{CompileError, CompileErrorContent};
use super::linker::link;
use super::snippet::{NoValidation, RustSnippetValidator, SnippetValidator};
use super::utils::*;
use crate::runtime::{
    displayed, Cursor, Diagnostics, EXPECTED_ANY_CHAR, EXPECTED_DIFFERENT, EXPECTED_END,
};
use tracing::{debug, trace};

/// Options of the [compiler](parse_grammar_with_options)
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Check that actions and semantic predicates are syntactically valid Rust
    pub validate_actions: bool,
}

impl CompileOptions {
    /// Get the default options
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validate_actions: true,
        }
    }
}

/// Compile a grammar to a linked [syntax tree](`Grammar`), ready for code generation or execution
pub fn parse_grammar(source: &str) -> Result<Grammar, CompileError> {
    parse_grammar_with_options(source, &CompileOptions::new())
}

/// Compile a grammar with custom options
pub fn parse_grammar_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<Grammar, CompileError> {
    let mut grammar = if options.validate_actions {
        parse_grammar_nocheck(source, &RustSnippetValidator)?
    } else {
        parse_grammar_nocheck(source, &NoValidation)?
    };

    link(&mut grammar)?;

    Ok(grammar)
}

/// Parse a grammar without linking it
///
/// Calls are not resolved and lazy repetitions have no lookahead yet, the result must go through
/// [`link`] before being used. Duplicate rules and malformed snippets are still reported.
pub fn parse_grammar_nocheck(
    source: &str,
    validator: &dyn SnippetValidator,
) -> Result<Grammar, CompileError> {
    let mut parser = GrammarParser::new(source, validator);

    if !parser.grammar()? {
        let fallback = parser.pos();
        let err = std::mem::take(&mut parser.diagnostics).into_error(fallback);

        return Err(CompileError::new(
            err.position(),
            CompileErrorContent::Syntax(err.message().to_string()),
        ));
    }

    debug!(
        rules = parser.grammar.rules().len(),
        items = parser.grammar.items().len(),
        "parsed grammar"
    );

    Ok(parser.grammar)
}

type Parsed<T> = Result<Option<T>, CompileError>;

/// Hand-written recursive descent parser for grammar sources
///
/// Every matcher either succeeds or leaves the cursor where it was, and records what it expected in the
/// diagnostics, exactly like generated parsers do.
pub(super) struct GrammarParser<'s, 'v> {
    cursor: Cursor<'s>,
    pub(super) diagnostics: Diagnostics,
    validator: &'v dyn SnippetValidator,
    grammar: Grammar,
}

impl<'s, 'v> GrammarParser<'s, 'v> {
    fn new(source: &'s str, validator: &'v dyn SnippetValidator) -> Self {
        Self {
            cursor: Cursor::new(source),
            diagnostics: Diagnostics::new(),
            validator,
            grammar: Grammar::new(),
        }
    }

    pub(super) fn pos(&self) -> usize {
        self.cursor.position()
    }

    pub(super) fn rewind(&mut self, pos: usize) {
        self.cursor.set_position(pos);
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.cursor.input()[start..end]
    }

    pub(super) fn slice_from(&self, start: usize) -> &'s str {
        self.slice(start, self.pos())
    }

    /// Match an exact string
    pub(super) fn lit(&mut self, expected: &str) -> bool {
        let start = self.pos();

        if self.cursor.read_exact(expected).is_some() {
            return true;
        }

        self.diagnostics.record(displayed(expected), start);
        false
    }

    /// Match a single character satisfying a predicate
    pub(super) fn class(&mut self, description: &str, predicate: fn(char) -> bool) -> Option<char> {
        let start = self.pos();

        match self.cursor.read_char() {
            Some(c) if predicate(c) => Some(c),
            _ => {
                self.rewind(start);
                self.diagnostics.record(description, start);
                None
            }
        }
    }

    /// Match any character
    pub(super) fn any_char(&mut self) -> Option<char> {
        let start = self.pos();
        let c = self.cursor.read_char();

        if c.is_none() {
            self.diagnostics.record(EXPECTED_ANY_CHAR, start);
        }

        c
    }

    /// Match the end of input
    pub(super) fn at_end(&mut self) -> bool {
        if self.cursor.at_end() {
            return true;
        }

        let pos = self.pos();
        self.diagnostics.record(EXPECTED_END, pos);
        false
    }

    /// Negative lookahead: succeed if `probe` fails, never consume input
    pub(super) fn not_ahead(&mut self, probe: impl FnOnce(&mut Self) -> bool) -> bool {
        let saved = self.diagnostics.snapshot();
        let start = self.pos();

        let matched = probe(self);
        self.rewind(start);

        if matched {
            self.diagnostics.record(EXPECTED_DIFFERENT, start);
            false
        } else {
            self.diagnostics.restore(saved);
            true
        }
    }

    /// Register an action's code after validating it
    fn action(&mut self, snippet: Snippet) -> Result<SnippetId, CompileError> {
        self.validator
            .validate_action(snippet.code())
            .map_err(|msg| {
                CompileError::new(snippet.pos(), CompileErrorContent::InvalidActionCode(msg))
            })?;

        Ok(self.grammar.add_snippet(snippet))
    }

    /// Register a semantic predicate's code after validating it
    fn condition(&mut self, snippet: Snippet) -> Result<SnippetId, CompileError> {
        self.validator
            .validate_condition(snippet.code())
            .map_err(|msg| {
                CompileError::new(snippet.pos(), CompileErrorContent::InvalidActionCode(msg))
            })?;

        Ok(self.grammar.add_snippet(snippet))
    }

    /// Register a verbatim item after validating it
    fn verbatim(&mut self, snippet: Snippet) -> Result<SnippetId, CompileError> {
        self.validator
            .validate_verbatim(snippet.code())
            .map_err(|msg| {
                CompileError::new(snippet.pos(), CompileErrorContent::InvalidVerbatimCode(msg))
            })?;

        Ok(self.grammar.add_verbatim(snippet))
    }

    /// grammar <- ws (rule / verbatim)* $
    fn grammar(&mut self) -> Result<bool, CompileError> {
        self.ws();

        loop {
            if self.rule()? {
                continue;
            }

            if let Some(snippet) = self.action_block() {
                self.verbatim(snippet)?;
                continue;
            }

            break;
        }

        Ok(self.at_end())
    }

    /// rule <- header (':' annotation)? arrow expr ';'
    fn rule(&mut self) -> Result<bool, CompileError> {
        let start = self.pos();

        let (name, exported) = match self.entry_header() {
            Some(name) => (name, true),
            None => match self.rule_name() {
                Some(name) => (name, false),
                None => return Ok(false),
            },
        };

        let annotation = self.annotation();

        if !self.one_of_tokens(ARROWS) {
            self.rewind(start);
            return Ok(false);
        }

        let body = match self.expression()? {
            Some(body) => body,
            None => {
                self.rewind(start);
                return Ok(false);
            }
        };

        if !self.token(";") {
            self.rewind(start);
            return Ok(false);
        }

        if self.grammar.find_rule(&name).is_some() {
            return Err(CompileError::new(
                start,
                CompileErrorContent::DuplicateRule(name),
            ));
        }

        trace!(rule = %name, exported, "parsed rule");

        let mut rule = RuleDecl::new(name, start, body);

        if exported {
            rule = rule.exported();
        }

        if let Some(annotation) = annotation {
            rule = rule.with_annotation(annotation);
        }

        self.grammar.add_rule(rule);
        Ok(true)
    }

    /// header <- entry_ident '(' ('...' / lower_ident)? ')'
    fn entry_header(&mut self) -> Option<String> {
        let start = self.pos();

        if let Some(name) = self.entry_ident() {
            if self.token("(") {
                if !self.token("...") {
                    self.lower_ident();
                }

                if self.token(")") {
                    return Some(name);
                }
            }
        }

        self.rewind(start);
        None
    }

    /// annotation <- ':' ((!arrow char) ws)+
    fn annotation(&mut self) -> Option<String> {
        let start = self.pos();

        if !self.assign_colon() {
            return None;
        }

        let text_start = self.pos();
        let mut text_end = None;

        while self.not_ahead(|p| ARROWS.iter().any(|arrow| p.lit(arrow))) {
            if self.any_char().is_none() {
                break;
            }

            text_end = Some(self.pos());
            self.ws();
        }

        match text_end {
            Some(text_end) => Some(self.slice(text_start, text_end).trim().to_string()),
            None => {
                self.rewind(start);
                None
            }
        }
    }

    /// ':' !'+' !'>>' ws
    fn assign_colon(&mut self) -> bool {
        let start = self.pos();

        if self.lit(":") && self.not_ahead(|p| p.lit("+")) && self.not_ahead(|p| p.lit(">>")) {
            self.ws();
            return true;
        }

        self.rewind(start);
        false
    }

    /// capture_op <- ':' / ':+' / ':>>'
    fn capture_op(&mut self) -> Option<CaptureMode> {
        if self.assign_colon() {
            Some(CaptureMode::Assign)
        } else if self.token(":+") || self.token(":>>") {
            Some(CaptureMode::Append)
        } else {
            None
        }
    }

    /// expr <- ('/' ws)? seq ('/' ws seq)*
    fn expression(&mut self) -> Parsed<Expr> {
        let start = self.pos();

        // Leading separator is allowed
        self.token("/");

        let mut alternatives = match self.sequence()? {
            Some(first) => vec![first],
            None => {
                self.rewind(start);
                return Ok(None);
            }
        };

        loop {
            let before = self.pos();

            if !self.token("/") {
                break;
            }

            match self.sequence()? {
                Some(alternative) => alternatives.push(alternative),
                None => {
                    self.rewind(before);
                    break;
                }
            }
        }

        Ok(Some(Expr::choice(alternatives)))
    }

    /// seq <- item+
    fn sequence(&mut self) -> Parsed<Expr> {
        let mut items = vec![];

        while let Some(item) = self.item()? {
            items.push(item);
        }

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Expr::sequence(items)))
        }
    }

    /// item <- prefixed (capture_op var)?
    fn item(&mut self) -> Parsed<Expr> {
        let inner = match self.prefixed()? {
            Some(inner) => inner,
            None => return Ok(None),
        };

        let before = self.pos();

        if let Some(mode) = self.capture_op() {
            if let Some(var) = self.variable()? {
                return Ok(Some(Expr::Capture {
                    mode,
                    var,
                    inner: Box::new(inner),
                }));
            }

            self.rewind(before);
        }

        Ok(Some(inner))
    }

    /// prefixed <- '&' action / '&' prefixed / '!' prefixed / suffixed
    fn prefixed(&mut self) -> Parsed<Expr> {
        let start = self.pos();

        if self.token("&") {
            if let Some(snippet) = self.action_block() {
                let id = self.condition(snippet)?;
                return Ok(Some(Expr::SemanticPredicate(id)));
            }

            if let Some(inner) = self.prefixed()? {
                return Ok(Some(Expr::Predicate {
                    positive: true,
                    inner: Box::new(inner),
                }));
            }

            self.rewind(start);
        }

        if self.token("!") {
            if let Some(inner) = self.prefixed()? {
                return Ok(Some(Expr::Predicate {
                    positive: false,
                    inner: Box::new(inner),
                }));
            }

            self.rewind(start);
        }

        self.suffixed()
    }

    /// suffixed <- primary ('*?' / '*' / '+' / '?')*
    fn suffixed(&mut self) -> Parsed<Expr> {
        let mut expr = match self.primary()? {
            Some(expr) => expr,
            None => return Ok(None),
        };

        loop {
            let op_pos = self.pos();

            let kind = if self.token("*?") {
                RepeatKind::LazyUntil(Lookahead::unresolved(op_pos))
            } else if self.token("*") {
                RepeatKind::ZeroOrMore
            } else if self.token("+") {
                RepeatKind::OneOrMore
            } else if self.token("?") {
                RepeatKind::Optional
            } else {
                break;
            };

            expr = Expr::repeat(kind, expr);
        }

        Ok(Some(expr))
    }

    /// primary <- '(' expr ')' / '<' expr '>' capture_op var / atom
    fn primary(&mut self) -> Parsed<Expr> {
        let start = self.pos();

        if self.token("(") {
            if let Some(expr) = self.expression()? {
                if self.token(")") {
                    return Ok(Some(expr));
                }
            }

            self.rewind(start);
        }

        if self.token("<") {
            if let Some(inner) = self.expression()? {
                if self.token(">") {
                    if let Some(mode) = self.capture_op() {
                        if let Some(var) = self.variable()? {
                            return Ok(Some(Expr::TextCapture {
                                mode,
                                var,
                                inner: Box::new(inner),
                            }));
                        }
                    }
                }
            }

            self.rewind(start);
        }

        self.atom()
    }

    /// atom <- range / string / rule_name / 'char' / action / '$' / '^' / restore / mark
    fn atom(&mut self) -> Parsed<Expr> {
        let start = self.pos();

        if let Some((from, to)) = self.char_range()? {
            return Ok(Some(Expr::CharRange(from, to)));
        }

        if let Some(text) = self.string_literal()? {
            return Ok(Some(Expr::Literal(text)));
        }

        if let Some(name) = self.rule_name() {
            return Ok(Some(Expr::call(name, start)));
        }

        if self.keyword("char") {
            return Ok(Some(Expr::AnyChar));
        }

        if let Some(snippet) = self.action_block() {
            let id = self.action(snippet)?;
            return Ok(Some(Expr::Action(id)));
        }

        if self.token("$") {
            return Ok(Some(Expr::EndAnchor));
        }

        if self.token("^") {
            return Ok(Some(Expr::StartAnchor));
        }

        if let Some(var) = self.position_restore()? {
            return Ok(Some(Expr::PositionRestore(var)));
        }

        if self.token("@") || self.keyword("at") {
            return Ok(Some(Expr::PositionMark));
        }

        Ok(None)
    }

    /// restore <- '@' '=' var / 'at' var
    fn position_restore(&mut self) -> Parsed<String> {
        let start = self.pos();

        if self.token("@") && self.token("=") {
            if let Some(var) = self.variable()? {
                return Ok(Some(var));
            }
        }

        self.rewind(start);

        if self.keyword("at") {
            if let Some(var) = self.variable()? {
                return Ok(Some(var));
            }
        }

        self.rewind(start);
        Ok(None)
    }

    /// Match a variable's name, which must not clash with the generated parser's own names
    fn variable(&mut self) -> Parsed<String> {
        let start = self.pos();

        match self.var_name() {
            Some(var) if var.starts_with(RESERVED_PREFIX) => Err(CompileError::new(
                start,
                CompileErrorContent::ReservedVariable(var),
            )),
            var => Ok(var),
        }
    }

    /// range <- string ('...' / '..' / '…' / '‥') string
    fn char_range(&mut self) -> Parsed<(char, char)> {
        let start = self.pos();

        let from = match self.string_literal()? {
            Some(from) => from,
            None => return Ok(None),
        };

        if !self.one_of_tokens(RANGE_OPERATORS) {
            self.rewind(start);
            return Ok(None);
        }

        let to = match self.string_literal()? {
            Some(to) => to,
            None => {
                self.rewind(start);
                return Ok(None);
            }
        };

        match (single_char(&from), single_char(&to)) {
            (Some(from), Some(to)) => Ok(Some((from, to))),
            _ => Err(CompileError::new(
                start,
                CompileErrorContent::InvalidCharRange { from, to },
            )),
        }
    }
}

/// Get the only character of a string
fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Grammar {
        parse_grammar_nocheck(source, &RustSnippetValidator).unwrap()
    }

    fn parse_err(source: &str) -> CompileError {
        parse_grammar_nocheck(source, &RustSnippetValidator).unwrap_err()
    }

    fn body(source: &str) -> Expr {
        parse(source).rules()[0].body().clone()
    }

    fn lit(text: &str) -> Expr {
        Expr::Literal(text.to_string())
    }

    #[test]
    fn parses_rules_in_order_with_first_as_entry_point() {
        let grammar = parse("Digit <- '0'...'9' ;\nDigits() <- Digit+ ;\nOther = 'x' ;");
        let names: Vec<_> = grammar.rules().iter().map(RuleDecl::name).collect();

        assert_eq!(names, ["Digit", "Digits", "Other"]);
        assert!(grammar.rules()[0].is_entry_point());
        assert!(!grammar.rules()[0].is_exported());
        assert!(grammar.rules()[1].is_entry_point() && grammar.rules()[1].is_exported());
        assert!(!grammar.rules()[2].is_entry_point());
        assert_eq!(grammar.rules()[1].pos(), 21);
    }

    #[test]
    fn parses_operators_with_expected_precedence() {
        assert_eq!(
            body("R <- / 'a' 'b'* :x / !'c' ;"),
            Expr::Choice(vec![
                Expr::Sequence(vec![
                    lit("a"),
                    Expr::Capture {
                        mode: CaptureMode::Assign,
                        var: "x".to_string(),
                        inner: Box::new(Expr::repeat(RepeatKind::ZeroOrMore, lit("b"))),
                    },
                ]),
                Expr::Predicate {
                    positive: false,
                    inner: Box::new(lit("c")),
                },
            ])
        );
    }

    #[test]
    fn parses_literal_forms_and_ranges() {
        assert_eq!(
            body("R ← \"a'b\" U+41 'x'..'y' 'a'…'b' U+30‥U+39 ;"),
            Expr::Sequence(vec![
                lit("a'b"),
                lit("A"),
                Expr::CharRange('x', 'y'),
                Expr::CharRange('a', 'b'),
                Expr::CharRange('0', '9'),
            ])
        );
    }

    #[test]
    fn parses_captures_and_positions() {
        assert_eq!(
            body("R <- <char+> :+ (t) @ :p at p @= p ^ $ x:>>l ;"),
            Expr::Sequence(vec![
                Expr::TextCapture {
                    mode: CaptureMode::Append,
                    var: "t".to_string(),
                    inner: Box::new(Expr::repeat(RepeatKind::OneOrMore, Expr::AnyChar)),
                },
                Expr::Capture {
                    mode: CaptureMode::Assign,
                    var: "p".to_string(),
                    inner: Box::new(Expr::PositionMark),
                },
                Expr::PositionRestore("p".to_string()),
                Expr::PositionRestore("p".to_string()),
                Expr::StartAnchor,
                Expr::EndAnchor,
                Expr::Capture {
                    mode: CaptureMode::Append,
                    var: "l".to_string(),
                    inner: Box::new(Expr::call("x", 39)),
                },
            ])
        );
    }

    #[test]
    fn keywords_are_not_rule_names_unless_extended() {
        assert_eq!(
            body("R <- char characters `with space` ;"),
            Expr::Sequence(vec![
                Expr::AnyChar,
                Expr::call("characters", 10),
                Expr::call("with space", 21),
            ])
        );
    }

    #[test]
    fn lazy_repetition_is_left_unresolved() {
        assert_eq!(
            body("R <- char*? ' ' ;"),
            Expr::Sequence(vec![
                Expr::repeat(RepeatKind::LazyUntil(Lookahead::unresolved(9)), Expr::AnyChar),
                lit(" "),
            ])
        );
    }

    #[test]
    fn skips_comments_and_keeps_annotations() {
        let grammar = parse("# header\nR : some annotation <- 'a' ; -- trailing\n-- last");
        assert_eq!(grammar.rules()[0].annotation(), Some("some annotation"));
        assert_eq!(grammar.rules()[0].body(), &lit("a"));
    }

    #[test]
    fn stores_actions_and_verbatim_code() {
        let grammar = parse("{ use std::fmt; }\nR <- 'a' { val = Value::from(1usize); } &{ true } ;");
        assert_eq!(grammar.items().len(), 2);

        match grammar.items()[0] {
            Item::Verbatim(id) => assert_eq!(grammar.snippet(id).code(), " use std::fmt; "),
            other => panic!("unexpected item {:?}", other),
        }

        match grammar.rules()[0].body() {
            Expr::Sequence(items) => {
                assert!(matches!(items[1], Expr::Action(_)));
                assert!(matches!(items[2], Expr::SemanticPredicate(_)));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn supports_multi_line_actions() {
        let grammar = parse("R <- 'a' {...\n  let close = \"}\";\n...} ;");

        match grammar.rules()[0].body() {
            Expr::Sequence(items) => match items[1] {
                Expr::Action(id) => {
                    assert_eq!(grammar.snippet(id).code(), "  let close = \"}\";\n")
                }
                ref other => panic!("unexpected item {:?}", other),
            },
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn rejects_duplicate_rules_at_second_declaration() {
        let err = parse_err("A <- 'x' ;\nB <- 'y' ;\nA <- 'z' ;");
        assert_eq!(err.content(), &CompileErrorContent::DuplicateRule("A".to_string()));
        assert_eq!(err.pos(), 22);
        assert_eq!(err.message(), "rule A is defined more than once");
    }

    #[test]
    fn rejects_malformed_action_code_at_its_position() {
        let err = parse_err("R <- 'a' { let = ; } ;");
        assert_eq!(err.pos(), 9);
        assert!(matches!(err.content(), CompileErrorContent::InvalidActionCode(_)));

        assert!(parse_grammar_nocheck("R <- 'a' { let = ; } ;", &NoValidation).is_ok());
    }

    #[test]
    fn rejects_invalid_ranges_and_code_points() {
        let err = parse_err("R <- 'ab'...'z' ;");
        assert_eq!(err.message(), "\"ab\" or \"z\" is not a character");

        let err = parse_err("R <- U+110000 ;");
        assert_eq!(err.message(), "U+110000 is not supported");
        assert_eq!(err.pos(), 5);
    }

    #[test]
    fn reports_furthest_failure() {
        let err = parse_err("R <- 'a' 'b'\n");
        assert_eq!(err.pos(), 13);
        assert!(err.message().ends_with("\"/\" or \";\" is expected"), "{}", err.message());
        assert!(err.message().contains("\"*?\""));
    }
}
