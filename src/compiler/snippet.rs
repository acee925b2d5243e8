/// Checks that embedded code fragments are well-formed in the target language
///
/// The bootstrap parser calls it for every action, semantic predicate and verbatim item, so that a broken
/// snippet is reported at its position in the grammar instead of inside the generated output.
pub trait SnippetValidator {
    /// Validate the body of an action (`{ ... }`)
    fn validate_action(&self, code: &str) -> Result<(), String>;

    /// Validate the body of a semantic predicate (`&{ ... }`)
    fn validate_condition(&self, code: &str) -> Result<(), String> {
        self.validate_action(code)
    }

    /// Validate top-level code copied as-is into the generated output (`{ ... }` between rules)
    fn validate_verbatim(&self, code: &str) -> Result<(), String>;
}

/// Validates snippets as Rust blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct RustSnippetValidator;

impl SnippetValidator for RustSnippetValidator {
    fn validate_action(&self, code: &str) -> Result<(), String> {
        parse_rust_block(code).map(|_| ())
    }

    fn validate_verbatim(&self, code: &str) -> Result<(), String> {
        syn::parse_str::<syn::File>(code)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// Accepts any snippet
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl SnippetValidator for NoValidation {
    fn validate_action(&self, _: &str) -> Result<(), String> {
        Ok(())
    }

    fn validate_verbatim(&self, _: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Parse a snippet as the content of a Rust block
pub fn parse_rust_block(code: &str) -> Result<syn::Block, String> {
    // Line breaks keep a trailing line comment from swallowing the closing brace
    syn::parse_str::<syn::Block>(&format!("{{\n{}\n}}", code)).map_err(|err| err.to_string())
}
