use super::data::{Expr, Grammar, Lookahead, RepeatKind, RuleDecl, RuleId};
use super::errors::{CompileError, CompileErrorContent};
use super::utils::{DEFAULT_ENTRY_POINT, RESERVED_ENTRY_POINTS, RESERVED_PREFIX};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Link a grammar parsed with [`super::parse_grammar_nocheck`]
///
/// Grammars compiled with [`super::parse_grammar`] are already linked. Linking:
///
/// 1. assigns every rule a unique callable name,
/// 2. resolves every call to the rule it targets,
/// 3. splices into each lazy repetition (`*?`) the rest of its enclosing sequence, used as its lookahead,
/// 4. checks that entry points can be exposed as functions of the generated parser,
/// 5. checks that no variable uses the prefix reserved for the generated parser's own names.
///
/// Linking twice is harmless.
pub fn link(grammar: &mut Grammar) -> Result<(), CompileError> {
    let symbols = assign_callables(grammar)?;

    for rule in &mut grammar.rules {
        resolve_calls(&mut rule.body, &symbols)?;
    }

    for rule in &mut grammar.rules {
        splice_lookaheads(&mut rule.body);

        if let Some(pos) = first_unresolved_lookahead(&rule.body) {
            return Err(CompileError::new(
                pos,
                CompileErrorContent::MissingLazyLookahead,
            ));
        }
    }

    check_entry_points(grammar)?;

    for rule in &grammar.rules {
        check_variables(rule)?;
    }

    debug!(rules = grammar.rules.len(), "linked grammar");

    Ok(())
}

/// Assign callable names and build the name lookup table
fn assign_callables(grammar: &mut Grammar) -> Result<HashMap<String, RuleId>, CompileError> {
    let mut symbols = HashMap::new();

    for (index, rule) in grammar.rules.iter_mut().enumerate() {
        if symbols.insert(rule.name.clone(), RuleId(index)).is_some() {
            return Err(CompileError::new(
                rule.pos,
                CompileErrorContent::DuplicateRule(rule.name.clone()),
            ));
        }

        let callable = format!("{}nonterm{}", RESERVED_PREFIX, index);
        trace!(rule = %rule.name, callable = %callable, "assigned callable");

        rule.callable = Some(callable);
    }

    Ok(symbols)
}

/// Resolve every call of an expression
fn resolve_calls(expr: &mut Expr, symbols: &HashMap<String, RuleId>) -> Result<(), CompileError> {
    if let Expr::Call(rule_ref) = expr {
        let target = symbols.get(&rule_ref.name).copied().ok_or_else(|| {
            CompileError::new(
                rule_ref.pos,
                CompileErrorContent::UndefinedRule(rule_ref.name.clone()),
            )
        })?;

        rule_ref.target = Some(target);
    }

    for child in expr.children_mut() {
        resolve_calls(child, symbols)?;
    }

    Ok(())
}

/// Give every unresolved lazy repetition a lookahead, bottom-up
///
/// In a sequence, the first item holding unresolved lazy repetitions gets the following items as their
/// lookahead. When that item is the last one, they stay unresolved and are handled by an enclosing
/// sequence, if any.
fn splice_lookaheads(expr: &mut Expr) {
    for child in expr.children_mut() {
        splice_lookaheads(child);
    }

    if let Expr::Sequence(items) = expr {
        let pending = items.iter().position(has_unresolved_lookahead);

        if let Some(index) = pending {
            if index + 1 < items.len() {
                let follow = Expr::sequence(items[index + 1..].to_vec());
                fill_lookaheads(&mut items[index], &follow);
            }
        }
    }
}

/// Set the follow of every unresolved lazy repetition of an expression
///
/// Follows spliced earlier are visited too, but not the one being inserted.
fn fill_lookaheads(expr: &mut Expr, follow: &Expr) {
    match expr {
        Expr::Repeat {
            kind: RepeatKind::LazyUntil(lookahead),
            inner,
        } => {
            fill_lookaheads(inner, follow);

            match &mut lookahead.follow {
                Some(existing) => fill_lookaheads(existing, follow),
                None => lookahead.follow = Some(Box::new(follow.clone())),
            }
        }

        _ => {
            for child in expr.children_mut() {
                fill_lookaheads(child, follow);
            }
        }
    }
}

/// Does an expression hold an unresolved lazy repetition?
fn has_unresolved_lookahead(expr: &Expr) -> bool {
    first_unresolved_lookahead(expr).is_some()
}

/// Get the position of the first unresolved lazy repetition of an expression
fn first_unresolved_lookahead(expr: &Expr) -> Option<usize> {
    let mut found = None;

    expr.walk(&mut |expr| {
        if let Expr::Repeat {
            kind: RepeatKind::LazyUntil(Lookahead { pos, follow: None }),
            ..
        } = expr
        {
            found = found.or(Some(*pos));
        }
    });

    found
}

/// Check that entry points can become public functions of the generated parser
fn check_entry_points(grammar: &Grammar) -> Result<(), CompileError> {
    for (index, rule) in grammar.rules.iter().enumerate() {
        if !rule.exported {
            continue;
        }

        let conflicts = RESERVED_ENTRY_POINTS.contains(&rule.name.as_str())
            || rule.name.starts_with(RESERVED_PREFIX)
            || (rule.name == DEFAULT_ENTRY_POINT && index != 0);

        if conflicts {
            return Err(CompileError::new(
                rule.pos,
                CompileErrorContent::InvalidEntryPoint(rule.name.clone()),
            ));
        }
    }

    Ok(())
}

/// Check that the variables of a rule do not clash with the generated parser's locals
///
/// The bootstrap parser already reports these at the variable's position, this covers grammars built
/// programmatically, which are reported at the rule's position.
fn check_variables(rule: &RuleDecl) -> Result<(), CompileError> {
    let mut reserved = None;

    rule.body.walk(&mut |expr| {
        let var = match expr {
            Expr::Capture { var, .. } | Expr::TextCapture { var, .. } => var,
            Expr::PositionRestore(var) => var,
            _ => return,
        };

        if reserved.is_none() && var.starts_with(RESERVED_PREFIX) {
            reserved = Some(var.clone());
        }
    });

    match reserved {
        Some(var) => Err(CompileError::new(
            rule.pos,
            CompileErrorContent::ReservedVariable(var),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{parse_grammar, parse_grammar_nocheck, CaptureMode, RustSnippetValidator};

    fn link_source(source: &str) -> Result<Grammar, CompileError> {
        let mut grammar = parse_grammar_nocheck(source, &RustSnippetValidator)?;
        link(&mut grammar)?;
        Ok(grammar)
    }

    fn lazy_follow(expr: &Expr) -> Option<Expr> {
        let mut follow = None;

        expr.walk(&mut |expr| {
            if let Expr::Repeat {
                kind: RepeatKind::LazyUntil(lookahead),
                ..
            } = expr
            {
                if follow.is_none() {
                    follow = lookahead.follow().cloned();
                }
            }
        });

        follow
    }

    #[test]
    fn assigns_unique_callables_and_resolves_calls() {
        let grammar = link_source("A <- B C ; B <- 'b' ; C <- B ;").unwrap();

        let callables: Vec<_> = grammar.rules().iter().filter_map(RuleDecl::callable).collect();
        assert_eq!(callables, ["yy_nonterm0", "yy_nonterm1", "yy_nonterm2"]);

        let mut targets = vec![];
        grammar.rules()[0].body().walk(&mut |expr| {
            if let Expr::Call(rule_ref) = expr {
                targets.push(rule_ref.target());
            }
        });

        assert_eq!(targets, [Some(RuleId(1)), Some(RuleId(2))]);
    }

    #[test]
    fn reports_undefined_rule_at_call_position() {
        let err = link_source("A <- 'a' missing ;").unwrap_err();

        assert_eq!(err.message(), "rule missing is not defined");
        assert_eq!(err.pos(), 9);
    }

    #[test]
    fn rejects_duplicates_in_programmatic_grammars() {
        let mut grammar = Grammar::new();
        grammar.add_rule(RuleDecl::new("A", 0, Expr::AnyChar));
        grammar.add_rule(RuleDecl::new("A", 7, Expr::AnyChar));

        let err = link(&mut grammar).unwrap_err();
        assert_eq!(err.pos(), 7);
        assert_eq!(err.content(), &CompileErrorContent::DuplicateRule("A".to_string()));
    }

    #[test]
    fn splices_rest_of_sequence_into_lazy_repetition() {
        let grammar = link_source("W <- (char*? ' ') 'x' ;").unwrap();

        assert_eq!(
            lazy_follow(grammar.rules()[0].body()),
            Some(Expr::Literal(" ".to_string()))
        );
    }

    #[test]
    fn propagates_lookahead_through_groups_and_captures() {
        let grammar = link_source("W <- ('a' char*?) :v ' ' 'b' ;").unwrap();

        assert_eq!(
            lazy_follow(grammar.rules()[0].body()),
            Some(Expr::Sequence(vec![
                Expr::Literal(" ".to_string()),
                Expr::Literal("b".to_string())
            ]))
        );
    }

    #[test]
    fn propagates_lookahead_through_choices() {
        let grammar = link_source("W <- ('a'*? / 'b') 'c' ;").unwrap();

        assert_eq!(
            lazy_follow(grammar.rules()[0].body()),
            Some(Expr::Literal("c".to_string()))
        );
    }

    #[test]
    fn lookahead_of_nested_sequence_is_completed_by_enclosing_one() {
        let grammar = link_source("W <- ('x' char*? 'y' char*?) 'z' ;").unwrap();

        let mut follows = vec![];
        grammar.rules()[0].body().walk(&mut |expr| {
            if let Expr::Repeat {
                kind: RepeatKind::LazyUntil(lookahead),
                ..
            } = expr
            {
                follows.push(lookahead.follow().cloned());
            }
        });

        assert!(follows.iter().all(Option::is_some));
        assert_eq!(follows.last().cloned().flatten(), Some(Expr::Literal("z".to_string())));
    }

    #[test]
    fn rejects_lazy_repetition_ending_a_rule() {
        let err = link_source("W <- 'a' char*? ;").unwrap_err();

        assert_eq!(err.content(), &CompileErrorContent::MissingLazyLookahead);
        assert_eq!(err.pos(), 13);
    }

    #[test]
    fn rejects_conflicting_entry_points() {
        let err = link_source("A <- 'a' ; parse() <- 'b' ;").unwrap_err();
        assert_eq!(err.content(), &CompileErrorContent::InvalidEntryPoint("parse".to_string()));

        let err = link_source("A <- 'a' ; line_and_column() <- 'b' ;").unwrap_err();
        assert_eq!(err.pos(), 11);

        assert!(link_source("parse() <- 'a' ;").is_ok());
    }

    #[test]
    fn rejects_reserved_variables() {
        let err = link_source("R <- <'a'> :yy_context 'b' ;").unwrap_err();
        assert_eq!(
            err.content(),
            &CompileErrorContent::ReservedVariable("yy_context".to_string())
        );
        assert_eq!(err.pos(), 12);

        let err = link_source("R <- 'a' :x @=yy_var0 ;").unwrap_err();
        assert_eq!(err.pos(), 14);

        let mut grammar = Grammar::new();
        grammar.add_rule(RuleDecl::new("A", 0, Expr::AnyChar));
        grammar.add_rule(RuleDecl::new(
            "B",
            9,
            Expr::Capture {
                mode: CaptureMode::Assign,
                var: "yy_var0".to_string(),
                inner: Box::new(Expr::AnyChar),
            },
        ));

        let err = link(&mut grammar).unwrap_err();
        assert_eq!(err.pos(), 9);
        assert_eq!(
            err.content(),
            &CompileErrorContent::ReservedVariable("yy_var0".to_string())
        );

        assert!(link_source("R <- 'a' :yy ;").is_ok());
    }

    #[test]
    fn linking_twice_is_harmless() {
        let mut grammar = parse_grammar("W <- char*? ';' ; X <- W ;").unwrap();
        let linked = grammar.clone();

        link(&mut grammar).unwrap();
        assert_eq!(grammar, linked);
    }
}
