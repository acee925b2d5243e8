//! # peg2rs
//!
//! peg2rs is a parser generator based on PEG grammars with embedded Rust actions. A grammar is compiled
//! to a recursive-descent parser written in plain Rust, with furthest-failure error reporting.
//!
//! It provides functions to [compile grammars](`compiler::parse_grammar`), to [generate Rust code](`generators`)
//! from them, as well as an [interpreter](`runtime::execute`) to try grammars out without generating anything.
//!
//! ## Usage
//!
//! ```rust
//! use peg2rs::compiler::{parse_grammar, pretty_format_compile_error};
//! use peg2rs::runtime::{execute, RuntimeContext, RuntimeOptions};
//!
//! // 1. Define the grammar
//! static GRAMMAR: &str = r#"
//! Greeting <- 'Hello' ' '+ <Name> :val '!'* ;
//! Name     <- ('a'...'z' / 'A'...'Z')+ ;
//! "#;
//!
//! // 2. Compile the grammar
//! let grammar = parse_grammar(GRAMMAR)
//!     .unwrap_or_else(|err| panic!("{}", pretty_format_compile_error(GRAMMAR, &err)));
//!
//! // 3. Run it on a subject
//! let parsed = execute(&RuntimeContext {
//!     grammar: &grammar,
//!     subject: "Hello  world!!",
//!     entry_point: None,
//!     options: RuntimeOptions::new(),
//! })
//! .unwrap_or_else(|err| panic!("{}", err));
//!
//! // 4. Play with the parsed content!
//! assert_eq!(parsed.value.unwrap().to_string(), "world");
//! ```
//!
//! With the `rustgen` feature (enabled by default), the same grammar can be turned into Rust source code
//! with [`generators::gen_rust_str`].

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

pub mod compiler;
pub mod generators;
pub mod runtime;
