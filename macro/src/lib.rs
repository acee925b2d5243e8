//! Attribute macro generating a parser at compile time
//!
//! ```ignore
//! use peg2rs_macro::peg_grammar;
//!
//! #[peg_grammar(filename = "grammars/digits.peg")]
//! mod digits {}
//!
//! let value = digits::parse("42").unwrap();
//! ```
//!
//! The path is relative to the root of the crate using the macro.

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

use lazy_static::lazy_static;
use peg2rs::compiler::{parse_grammar, pretty_format_compile_error, CompileError};
use peg2rs::generators::gen_rust_token_stream;
use proc_macro::TokenStream;
use quote::quote;
use regex::Regex;
use std::env;
use std::fs;
use std::path::PathBuf;
use syn::{Ident, ItemMod, Visibility};

lazy_static! {
    static ref ATTR_CONTENT: Regex =
        Regex::new("^filename\\s*=\\s*\"(?P<filename>[^\"]+)\"$").unwrap();
}

/// Options decoded from the attribute
struct Options {
    /// Input file (grammar)
    grammar_file: PathBuf,
}

/// Fill an empty inline module with the parser generated from a grammar file
#[proc_macro_attribute]
pub fn peg_grammar(attr: TokenStream, item: TokenStream) -> TokenStream {
    let (mod_ident, mod_vis) = parse_input_mod(item);

    let options = parse_options_attr(attr);

    if !options.grammar_file.exists() {
        panic!(
            "Grammar file was not found at path {} (tip: path starts from your crate's root directory)",
            options.grammar_file.display()
        );
    }

    let generated_rust = grammar_to_rust(&options);

    // Makes cargo rebuild the module when the grammar changes
    let tracked_path = options.grammar_file.display().to_string();

    let expanded = quote! {
        #mod_vis mod #mod_ident {
            const _: &str = include_str!(#tracked_path);

            #generated_rust
        }
    };

    TokenStream::from(expanded)
}

fn parse_input_mod(item: TokenStream) -> (Ident, Visibility) {
    let item = syn::parse::<ItemMod>(item).unwrap_or_else(|_| {
        panic!("This macro must be used on a module which will be filled with the parser")
    });

    let mod_ident = item.ident;

    let mod_content = item.content.unwrap_or_else(|| {
        panic!(
            "This macro must be used on an inline, empty module (e.g. 'mod {} {{}}')",
            mod_ident
        )
    });

    if !mod_content.1.is_empty() {
        panic!(
            "This macro must be used on an inline, empty module (e.g. 'mod {} {{}}')",
            mod_ident
        )
    }

    (mod_ident, item.vis)
}

fn parse_options_attr(attr: TokenStream) -> Options {
    let attr = attr.to_string();

    let captured = ATTR_CONTENT.captures(attr.trim()).unwrap_or_else(|| {
        panic!("Please provide a grammar file path under the form: #[peg_grammar(filename = \"<path>\")]")
    });

    let mut grammar_file = env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_default();

    grammar_file.push(&captured["filename"]);

    Options { grammar_file }
}

fn grammar_to_rust(options: &Options) -> proc_macro2::TokenStream {
    let grammar_src = fs::read_to_string(&options.grammar_file).unwrap_or_else(|err| {
        panic!(
            "Grammar file {} could not be read: {}",
            options.grammar_file.display(),
            err
        )
    });

    let grammar = parse_grammar(&grammar_src)
        .unwrap_or_else(|err| compilation_failed(options, &grammar_src, &err));

    gen_rust_token_stream(&grammar)
        .unwrap_or_else(|err| compilation_failed(options, &grammar_src, &err))
}

fn compilation_failed(options: &Options, grammar_src: &str, err: &CompileError) -> ! {
    panic!(
        "Failed to compile grammar {}:\n{}",
        options.grammar_file.display(),
        pretty_format_compile_error(grammar_src, err)
    )
}
