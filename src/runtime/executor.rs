use super::cursor::Cursor;
use super::data::Value;
use super::diagnostics::*;
use super::errors::RuntimeError;
use crate::compiler::{CaptureMode, Expr, Grammar, RepeatKind, RuleId, Snippet};
use std::collections::HashMap;
use tracing::trace;

/// Match a subject string against a [linked grammar](crate::compiler::parse_grammar)
///
/// Actions are ignored and semantic predicates are considered true, use [`execute_with_actions`] to
/// handle them.
pub fn execute(ctx: &RuntimeContext) -> Result<Parsed, RuntimeError> {
    execute_with_actions(ctx, &mut IgnoreActions)
}

/// Match a subject string against a linked grammar, delegating actions to a handler
pub fn execute_with_actions(
    ctx: &RuntimeContext,
    actions: &mut dyn ActionHandler,
) -> Result<Parsed, RuntimeError> {
    let entry = match ctx.entry_point {
        None => ctx.grammar.default_rule().ok_or(RuntimeError::EmptyGrammar)?,
        Some(name) => ctx
            .grammar
            .find_rule(name)
            .filter(|id| ctx.grammar.rule(*id).is_entry_point())
            .ok_or_else(|| RuntimeError::UnknownEntryPoint(name.to_string()))?,
    };

    let mut executor = Executor {
        grammar: ctx.grammar,
        cursor: Cursor::new(ctx.subject),
        diagnostics: Diagnostics::new(),
        actions,
    };

    let value = match executor.call_rule(entry)? {
        Some(value) if !ctx.options.require_end || executor.cursor.at_end() => value,
        Some(_) => {
            let pos = executor.cursor.position();
            executor.diagnostics.record(EXPECTED_END, pos);
            return Err(executor.diagnostics.into_error(pos).into());
        }
        None => {
            let pos = executor.cursor.position();
            return Err(executor.diagnostics.into_error(pos).into());
        }
    };

    Ok(Parsed {
        value: value.into_option(),
        position: executor.cursor.position(),
    })
}

/// Runtime context, used to provide informations to the [runtime](execute)
pub struct RuntimeContext<'a, 'b> {
    /// Linked grammar
    pub grammar: &'b Grammar,

    /// Subject to match against the grammar
    pub subject: &'a str,

    /// Name of the rule to start from, the first rule by default
    pub entry_point: Option<&'b str>,

    /// Runtime options
    pub options: RuntimeOptions,
}

/// Runtime options
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Fail if the entry rule does not consume the whole subject
    pub require_end: bool,
}

impl RuntimeOptions {
    /// Get the default runtime options
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { require_end: false }
    }
}

/// Successful match
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Value of the entry rule's `val` variable, `None` if it was never set
    pub value: Option<Value>,

    /// Position the entry rule stopped at
    pub position: usize,
}

/// Variables of a rule invocation
#[derive(Debug, Clone, Default)]
pub struct Frame {
    vars: HashMap<String, Value>,
}

impl Frame {
    /// Get a variable's value (`Nil` if it was never set)
    pub fn get(&self, name: &str) -> &Value {
        static NIL: Value = Value::Nil;
        self.vars.get(name).unwrap_or(&NIL)
    }

    /// Set a variable's value
    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Append to a variable's value
    pub fn append(&mut self, name: &str, value: Value) {
        self.vars.entry(name.to_string()).or_default().append(value);
    }

    /// Get the value returned by the rule
    pub fn val(&self) -> &Value {
        self.get("val")
    }

    fn take_val(&mut self) -> Value {
        self.vars.remove("val").unwrap_or_default()
    }
}

/// Handler for the code embedded in grammars
pub trait ActionHandler {
    /// Run an action, with access to the variables of the rule it belongs to
    fn action(&mut self, snippet: &Snippet, frame: &mut Frame) -> Result<(), String> {
        let _ = (snippet, frame);
        Ok(())
    }

    /// Evaluate a semantic predicate
    fn condition(&mut self, snippet: &Snippet, frame: &Frame) -> Result<bool, String> {
        let _ = (snippet, frame);
        Ok(true)
    }
}

/// Handler ignoring every action
pub struct IgnoreActions;

impl ActionHandler for IgnoreActions {}

type Step = Result<Option<Value>, RuntimeError>;

struct Executor<'a, 'b, 'h> {
    grammar: &'b Grammar,
    cursor: Cursor<'a>,
    diagnostics: Diagnostics,
    actions: &'h mut dyn ActionHandler,
}

impl<'a, 'b, 'h> Executor<'a, 'b, 'h> {
    fn call_rule(&mut self, id: RuleId) -> Step {
        let rule = self.grammar.rule(id);
        let start = self.cursor.position();

        trace!(rule = rule.name(), pos = start, "entering rule");

        let mut frame = Frame::default();
        let matched = self.eval(rule.body(), &mut frame)?;

        trace!(
            rule = rule.name(),
            pos = self.cursor.position(),
            matched = matched.is_some(),
            "leaving rule"
        );

        Ok(matched.map(|_| frame.take_val()))
    }

    fn eval(&mut self, expr: &'b Expr, frame: &mut Frame) -> Step {
        let start = self.cursor.position();

        match expr {
            Expr::Literal(text) => match self.cursor.read_exact(text) {
                Some(_) => Ok(Some(Value::Str(text.clone()))),
                None => {
                    self.diagnostics.record(displayed(text), start);
                    Ok(None)
                }
            },

            Expr::CharRange(from, to) => match self.cursor.read_char() {
                Some(c) if *from <= c && c <= *to => Ok(Some(Value::Char(c))),
                _ => {
                    self.cursor.set_position(start);
                    self.diagnostics.record(displayed_range(*from, *to), start);
                    Ok(None)
                }
            },

            Expr::AnyChar => match self.cursor.read_char() {
                Some(c) => Ok(Some(Value::Char(c))),
                None => {
                    self.diagnostics.record(EXPECTED_ANY_CHAR, start);
                    Ok(None)
                }
            },

            Expr::StartAnchor => Ok(self.anchor(self.cursor.at_start(), EXPECTED_BEGINNING)),

            Expr::EndAnchor => Ok(self.anchor(self.cursor.at_end(), EXPECTED_END)),

            Expr::PositionMark => Ok(Some(Value::Pos(start))),

            Expr::PositionRestore(var) => {
                if let Value::Pos(pos) = frame.get(var) {
                    self.cursor.set_position(*pos);
                }

                Ok(Some(Value::Nil))
            }

            Expr::Call(rule_ref) => match rule_ref.target() {
                Some(target) => self.call_rule(target),
                None => Err(RuntimeError::UnresolvedRule(rule_ref.name().to_string())),
            },

            Expr::Sequence(items) => {
                for item in items {
                    if self.eval(item, frame)?.is_none() {
                        self.cursor.set_position(start);
                        return Ok(None);
                    }
                }

                Ok(Some(Value::Nil))
            }

            Expr::Choice(alternatives) => {
                for alternative in alternatives {
                    if let Some(value) = self.eval(alternative, frame)? {
                        return Ok(Some(value));
                    }

                    self.cursor.set_position(start);
                }

                Ok(None)
            }

            Expr::Repeat { kind, inner } => self.repeat(kind, inner, frame),

            Expr::Predicate { positive, inner } => {
                let saved = self.diagnostics.snapshot();
                let matched = self.eval(inner, frame)?.is_some();
                self.cursor.set_position(start);

                match (*positive, matched) {
                    (true, true) => Ok(Some(Value::Nil)),
                    (true, false) => Ok(None),
                    (false, false) => {
                        self.diagnostics.restore(saved);
                        Ok(Some(Value::Nil))
                    }
                    (false, true) => {
                        self.diagnostics.record(EXPECTED_DIFFERENT, start);
                        Ok(None)
                    }
                }
            }

            Expr::SemanticPredicate(id) => {
                let snippet = self.grammar.snippet(*id);

                let holds = self
                    .actions
                    .condition(snippet, frame)
                    .map_err(|message| RuntimeError::Action {
                        pos: snippet.pos(),
                        message,
                    })?;

                Ok(if holds { Some(Value::Nil) } else { None })
            }

            Expr::Capture { mode, var, inner } => {
                let value = self.eval(inner, frame)?;

                if let Some(value) = &value {
                    store(frame, *mode, var, value.clone());
                }

                Ok(value)
            }

            Expr::TextCapture { mode, var, inner } => {
                if self.eval(inner, frame)?.is_none() {
                    return Ok(None);
                }

                let text = Value::Str(self.cursor.take_since(start).to_string());
                store(frame, *mode, var, text.clone());

                Ok(Some(text))
            }

            Expr::Action(id) => {
                let snippet = self.grammar.snippet(*id);

                self.actions
                    .action(snippet, frame)
                    .map_err(|message| RuntimeError::Action {
                        pos: snippet.pos(),
                        message,
                    })?;

                Ok(Some(Value::Nil))
            }
        }
    }

    fn anchor(&mut self, holds: bool, expectation: &str) -> Option<Value> {
        if holds {
            return Some(Value::Nil);
        }

        let pos = self.cursor.position();
        self.diagnostics.record(expectation, pos);
        None
    }

    fn repeat(&mut self, kind: &'b RepeatKind, inner: &'b Expr, frame: &mut Frame) -> Step {
        let start = self.cursor.position();

        if let RepeatKind::Optional = kind {
            return match self.eval(inner, frame)? {
                Some(value) => Ok(Some(value)),
                None => {
                    self.cursor.set_position(start);
                    Ok(Some(Value::Nil))
                }
            };
        }

        let follow = match kind {
            RepeatKind::LazyUntil(lookahead) => match lookahead.follow() {
                Some(follow) => Some(follow),
                None => {
                    return Err(RuntimeError::UnresolvedRule(format!(
                        "lookahead of *? at offset {}",
                        lookahead.pos()
                    )))
                }
            },
            _ => None,
        };

        let mut values = vec![];

        loop {
            let before = self.cursor.position();

            if let Some(follow) = follow {
                let found = self.eval(follow, frame)?.is_some();
                self.cursor.set_position(before);

                if found {
                    break;
                }
            }

            match self.eval(inner, frame)? {
                Some(value) => {
                    values.push(value);

                    // An iteration consuming nothing would repeat forever
                    if self.cursor.position() == before {
                        break;
                    }
                }
                None => {
                    self.cursor.set_position(before);
                    break;
                }
            }
        }

        if values.is_empty() && matches!(kind, RepeatKind::OneOrMore) {
            return Ok(None);
        }

        Ok(Some(Value::List(values)))
    }
}

fn store(frame: &mut Frame, mode: CaptureMode, var: &str, value: Value) {
    match mode {
        CaptureMode::Assign => frame.set(var, value),
        CaptureMode::Append => frame.append(var, value),
    }
}
