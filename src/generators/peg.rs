use crate::compiler::utils::{is_ident_char, is_rule_name_start, KEYWORDS};
use crate::compiler::*;

/// Generate a grammar's source from its syntax tree
///
/// Useful to get back to the source code after parsing, or to normalize a grammar: every rule is written
/// on its own line, with the minimal amount of parentheses.
///
/// Note that blank lines and comments, as well as additional whitespaces, won't be restored. Literals
/// containing both kinds of quotes are written as a sequence of literals.
pub fn gen_peg(grammar: &Grammar) -> String {
    let mut out = String::new();

    for item in grammar.items() {
        match item {
            Item::Verbatim(id) => out.push_str(&gen_code_block(grammar.snippet(*id).code())),
            Item::Rule(id) => out.push_str(&gen_peg_rule(grammar, grammar.rule(*id))),
        }

        out.push('\n');
    }

    out
}

/// Generate the source of a single rule
pub fn gen_peg_rule(grammar: &Grammar, rule: &RuleDecl) -> String {
    let header = if rule.is_exported() {
        format!("{}()", rule.name())
    } else {
        gen_rule_name(rule.name())
    };

    let annotation = rule
        .annotation()
        .map(|annotation| format!(" : {}", annotation))
        .unwrap_or_default();

    format!(
        "{}{} <- {} ;",
        header,
        annotation,
        gen_peg_expr(grammar, rule.body())
    )
}

/// Generate the source of a single expression
pub fn gen_peg_expr(grammar: &Grammar, expr: &Expr) -> String {
    gen_expr(grammar, expr, Precedence::Choice)
}

/// Binding strength of the grammar's operators, loosest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Choice,
    Sequence,
    Capture,
    Prefixed,
    Primary,
}

fn precedence(expr: &Expr) -> Precedence {
    match expr {
        Expr::Choice(_) => Precedence::Choice,
        Expr::Sequence(_) => Precedence::Sequence,
        Expr::Capture { .. } => Precedence::Capture,
        Expr::Predicate { .. } | Expr::SemanticPredicate(_) => Precedence::Prefixed,

        // Suffixes are never chained when written back, to avoid `e*` + `?` reading as `e*?`
        Expr::Repeat { .. } => Precedence::Prefixed,

        Expr::Literal(text) if literal_parts(text).len() > 1 => Precedence::Sequence,

        _ => Precedence::Primary,
    }
}

fn gen_expr(grammar: &Grammar, expr: &Expr, min: Precedence) -> String {
    let code = match expr {
        Expr::Literal(text) => literal_parts(text).join(" "),

        Expr::CharRange(from, to) => format!(
            "{}...{}",
            gen_literal(&from.to_string()),
            gen_literal(&to.to_string())
        ),

        Expr::AnyChar => "char".to_string(),
        Expr::StartAnchor => "^".to_string(),
        Expr::EndAnchor => "$".to_string(),
        Expr::PositionMark => "@".to_string(),
        Expr::PositionRestore(var) => format!("@={}", var),
        Expr::Call(rule_ref) => gen_rule_name(rule_ref.name()),

        Expr::Sequence(items) => items
            .iter()
            .map(|item| gen_expr(grammar, item, Precedence::Capture))
            .collect::<Vec<_>>()
            .join(" "),

        Expr::Choice(alternatives) => alternatives
            .iter()
            .map(|alternative| gen_expr(grammar, alternative, Precedence::Sequence))
            .collect::<Vec<_>>()
            .join(" / "),

        Expr::Repeat { kind, inner } => format!(
            "{}{}",
            gen_expr(grammar, inner, Precedence::Primary),
            kind.symbol()
        ),

        Expr::Predicate { positive, inner } => format!(
            "{}{}",
            if *positive { "&" } else { "!" },
            gen_expr(grammar, inner, Precedence::Prefixed)
        ),

        Expr::SemanticPredicate(id) => format!("&{}", gen_code_block(grammar.snippet(*id).code())),

        Expr::Capture { mode, var, inner } => format!(
            "{} {}{}",
            gen_expr(grammar, inner, Precedence::Prefixed),
            mode.symbol(),
            var
        ),

        Expr::TextCapture { mode, var, inner } => format!(
            "<{}> {}{}",
            gen_expr(grammar, inner, Precedence::Choice),
            mode.symbol(),
            var
        ),

        Expr::Action(id) => gen_code_block(grammar.snippet(*id).code()),
    };

    if precedence(expr) < min {
        format!("({})", code)
    } else {
        code
    }
}

/// Write a rule's name, back-quoting it when it cannot be written plainly
fn gen_rule_name(name: &str) -> String {
    let plain = name.chars().next().map_or(false, is_rule_name_start)
        && name.chars().all(is_ident_char)
        && !name.starts_with("--")
        && !KEYWORDS.contains(&name);

    if plain {
        name.to_string()
    } else {
        format!("`{}`", name)
    }
}

/// Quote a literal, picking a quote it does not contain
fn gen_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        text.chars()
            .map(|c| format!("U+{:04X}", c as u32))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split a literal into the quoted parts needed to write it
fn literal_parts(text: &str) -> Vec<String> {
    if !text.contains('\'') || !text.contains('"') || text.chars().count() == 1 {
        return vec![gen_literal(text)];
    }

    let mut parts = vec![];
    let mut current = String::new();

    for c in text.chars() {
        if (c == '\'' && current.contains('"')) || (c == '"' && current.contains('\'')) {
            parts.push(gen_literal(&current));
            current.clear();
        }

        current.push(c);
    }

    parts.push(gen_literal(&current));
    parts
}

/// Write a code fragment in braces, using the multi-line form when braces are not balanced
fn gen_code_block(code: &str) -> String {
    let mut depth = 0usize;
    let mut balanced = true;

    for c in code.chars() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => balanced = false,
            '}' => depth -= 1,
            _ => {}
        }
    }

    let looks_multi_line = code.trim_start().starts_with("...");

    if balanced && depth == 0 && !looks_multi_line {
        format!("{{{}}}", code)
    } else if code.ends_with('\n') {
        format!("{{...\n{}...}}", code)
    } else {
        format!("{{...\n{}\n...}}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(source: &str) -> String {
        gen_peg(&parse_grammar(source).unwrap())
    }

    #[test]
    fn writes_one_rule_per_line() {
        assert_eq!(
            normalize("Digit<-'0'..'9';\n\n# digits\nDigits ( ) = Digit+ ;"),
            "Digit <- '0'...'9' ;\nDigits() <- Digit+ ;\n"
        );
    }

    #[test]
    fn uses_minimal_parentheses() {
        assert_eq!(
            normalize("R <- ('a' / ('b' 'c')) ('d' :x) !('e' 'f') (('g')*)? ;"),
            "R <- ('a' / 'b' 'c') 'd' :x !('e' 'f') ('g'*)? ;\n"
        );
    }

    #[test]
    fn writes_captures_and_special_names() {
        assert_eq!(
            normalize("R : note <- <char*?> :+t ';' @ :p @=p `at` `a b` ^ $ ; at <- 'x' ; `a b` <- 'y' ;"),
            "R : note <- <char*?> :+t ';' @ :p @=p `at` `a b` ^ $ ;\n`at` <- 'x' ;\n`a b` <- 'y' ;\n"
        );
    }

    #[test]
    fn picks_quotes_not_contained_in_literals() {
        assert_eq!(gen_literal("it's"), "\"it's\"");
        assert_eq!(gen_literal("say \"hi\""), "'say \"hi\"'");
        assert_eq!(literal_parts("'\""), ["\"'\"", "'\"'"]);
    }

    #[test]
    fn keeps_code_blocks() {
        assert_eq!(
            normalize("{ use std::fmt; }\nR <- 'a' { val = Value::Nil; } &{ true } ;"),
            "{ use std::fmt; }\nR <- 'a' { val = Value::Nil; } &{ true } ;\n"
        );

        assert_eq!(gen_code_block("let s = \"}\";\n"), "{...\nlet s = \"}\";\n...}");
    }

    #[test]
    fn normalized_output_is_stable() {
        let once = normalize(
            "A <- (x :+l)* / !B &{ l.is_nil() } ; B <- 'b' (A / 'c')+ 'q'? ; x <- \"it's\" ;",
        );

        assert_eq!(normalize(&once), once);
    }
}
