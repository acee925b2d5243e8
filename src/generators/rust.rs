use crate::compiler::*;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::str::FromStr;
use tracing::debug;

mod gen_matchers;
mod prelude;

/// Generate the Rust source code of a parser, as a string
///
/// The output is meant to be included in its own module, see [`gen_rust_token_stream`].
pub fn gen_rust_str(grammar: &Grammar) -> Result<String, CompileError> {
    gen_rust_token_stream(grammar).map(|tokens| tokens.to_string())
}

/// Generate the Rust code of a parser from a [linked grammar](crate::compiler::parse_grammar)
///
/// The generated items are:
///
/// * a prelude (`Value`, `SyntaxError`, `line_and_column` and the private parsing context),
/// * verbatim code items and one function per rule, in the grammar's order,
/// * `pub fn parse(input: &str) -> Result<Option<Value>, SyntaxError>` for the first rule, and a
///   function with the same signature for every rule declared as `name() <- ...`.
///
/// Grammars that were not linked are rejected with [`CompileErrorContent::UnresolvedPlaceholder`].
pub fn gen_rust_token_stream(grammar: &Grammar) -> Result<TokenStream, CompileError> {
    let mut generator = RustGenerator::new(grammar);

    let prelude = prelude::gen_prelude();

    let items = grammar
        .items()
        .iter()
        .map(|item| match item {
            Item::Verbatim(id) => gen_verbatim(grammar.snippet(*id)),
            Item::Rule(id) => generator.gen_rule(*id),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let entry_points = gen_entry_points(grammar)?;

    debug!(
        items = items.len(),
        entry_points = entry_points.len(),
        temporaries = generator.counter,
        "generated rust parser"
    );

    Ok(quote! {
        #prelude
        #(#items)*
        #(#entry_points)*
    })
}

/// State of a single code generation
///
/// Owns the counter used to name temporaries (`yy_var<N>`), so that generations are independent.
pub(super) struct RustGenerator<'g> {
    grammar: &'g Grammar,
    counter: usize,
}

impl<'g> RustGenerator<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            counter: 0,
        }
    }

    /// Get a fresh temporary name
    fn fresh(&mut self) -> Ident {
        let ident = format_ident!("yy_var{}", self.counter);
        self.counter += 1;
        ident
    }
}

/// Get the callable of a rule, as assigned by the linker
fn callable_ident(rule: &RuleDecl) -> Result<Ident, CompileError> {
    rule.callable()
        .map(|callable| format_ident!("{}", callable))
        .ok_or_else(|| {
            CompileError::new(
                rule.pos(),
                CompileErrorContent::UnresolvedPlaceholder(format!(
                    "callable of rule {}",
                    rule.name()
                )),
            )
        })
}

fn gen_verbatim(snippet: &Snippet) -> Result<TokenStream, CompileError> {
    TokenStream::from_str(snippet.code()).map_err(|err| {
        CompileError::new(
            snippet.pos(),
            CompileErrorContent::InvalidVerbatimCode(err.to_string()),
        )
    })
}

fn gen_entry_points(grammar: &Grammar) -> Result<Vec<TokenStream>, CompileError> {
    let mut entry_points = vec![];

    for (index, rule) in grammar.rules().iter().enumerate() {
        let callable = callable_ident(rule)?;

        if index == 0 {
            entry_points.push(gen_entry_point(
                &format_ident!("parse"),
                &callable,
                rule.name(),
            ));
        }

        // The first rule may be exported as `parse()`, which was just generated
        if rule.is_exported() && !(index == 0 && rule.name() == "parse") {
            entry_points.push(gen_entry_point(
                &make_safe_ident(rule.name()),
                &callable,
                rule.name(),
            ));
        }
    }

    Ok(entry_points)
}

fn gen_entry_point(name: &Ident, callable: &Ident, rule_name: &str) -> TokenStream {
    let doc = format!(" Parse an input with rule `{}`", rule_name);

    quote! {
        #[doc = #doc]
        #[allow(non_snake_case, dead_code)]
        pub fn #name(input: &str) -> Result<Option<Value>, SyntaxError> {
            let mut yy_context = Context::new(input);

            match #callable(&mut yy_context) {
                Some(value) => Ok(value.into_option()),
                None => Err(yy_context.into_error()),
            }
        }
    }
}

/// Make an identifier usable in generated code
///
/// Keywords become raw identifiers, the few ones that cannot be raw get an underscore suffix.
pub fn make_safe_ident(ident: &str) -> Ident {
    if NON_RAW_KEYWORDS.contains(&ident) {
        format_ident!("{}_", ident)
    } else if RUST_RESERVED_KEYWORDS.contains(&ident) {
        format_ident!("r#{}", ident)
    } else {
        format_ident!("{}", ident)
    }
}

pub static RUST_RESERVED_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized",
    "virtual", "yield", "try", "union",
];

static NON_RAW_KEYWORDS: &[&str] = &["_", "self", "Self", "super", "crate"];

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(source: &str) -> String {
        gen_rust_str(&parse_grammar(source).unwrap()).unwrap()
    }

    fn functions(source: &str) -> Vec<String> {
        let tokens = gen_rust_token_stream(&parse_grammar(source).unwrap()).unwrap();
        let file = syn::parse2::<syn::File>(tokens).unwrap();

        file.items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Fn(function) => Some(function.sig.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn generates_valid_rust() {
        let names = functions(
            "{ use std::collections::HashMap; }\n\
             Digit <- '0'...'9' ;\n\
             Digits() <- (Digit :+d)+ { val = d.clone(); } ;\n\
             Lazy <- <char*?> :w ' ' @ :p &{ w.as_str().is_some() } @=p ;\n\
             Misc <- ^ !'x' &'y' char? 'z'* $ / 'a' ;",
        );

        assert_eq!(
            names,
            [
                "line_and_column",
                "yy_newline_length",
                "yy_nonterm0",
                "yy_nonterm1",
                "yy_nonterm2",
                "yy_nonterm3",
                "parse",
                "Digits"
            ]
        );
    }

    #[test]
    fn first_rule_exported_as_parse_is_generated_once() {
        let names = functions("parse() <- 'a' ;");
        assert_eq!(names.iter().filter(|name| *name == "parse").count(), 1);
    }

    #[test]
    fn keyword_entry_points_become_raw_identifiers() {
        assert_eq!(make_safe_ident("type").to_string(), "r#type");
        assert_eq!(make_safe_ident("Self").to_string(), "Self_");
        assert!(generate("A <- 'a' ; match() <- A ;").contains("pub fn r#match"));
    }

    #[test]
    fn embeds_expectations_at_generation_time() {
        let code = generate("R <- 'ab' 'é' '0'...'9' ;");

        assert!(code.contains(r#""\"ab\"""#), "{}", code);
        assert!(code.contains(r#""\"é (U+00E9)\"""#), "{}", code);
        assert!(code.contains(r#""\"0\"...\"9\"""#), "{}", code);
    }

    #[test]
    fn temporaries_are_numbered_per_generation() {
        let source = "R <- 'a' 'b' / 'c' ;";
        assert_eq!(generate(source), generate(source));
        assert!(generate(source).contains("yy_var0"));
    }

    #[test]
    fn rejects_unlexable_verbatim_code() {
        let mut grammar = Grammar::new();
        grammar.add_verbatim(Snippet::new("let s = \"open;", 3));
        grammar.add_rule(RuleDecl::new("R", 20, Expr::AnyChar));
        link(&mut grammar).unwrap();

        let err = gen_rust_str(&grammar).unwrap_err();
        assert_eq!(err.pos(), 3);
        assert!(matches!(err.content(), CompileErrorContent::InvalidVerbatimCode(_)));
    }

    #[test]
    fn rejects_unlinked_grammars() {
        let grammar = parse_grammar_nocheck("R <- S ; S <- 'a' ;", &NoValidation).unwrap();
        let err = gen_rust_str(&grammar).unwrap_err();

        assert!(matches!(
            err.content(),
            CompileErrorContent::UnresolvedPlaceholder(_)
        ));
    }
}
