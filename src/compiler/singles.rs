//! Token-level matchers of the bootstrap parser: whitespace, comments, names, literals and code blocks.

use super::data::Snippet;
use super::errors::{CompileError, CompileErrorContent};
use super::parser::GrammarParser;
use super::utils::*;
use crate::runtime::is_newline;

impl<'s, 'v> GrammarParser<'s, 'v> {
    /// Skip whitespaces and comments
    pub(super) fn ws(&mut self) {
        loop {
            if self.class("whitespace", is_whitespace).is_some() {
                continue;
            }

            if !self.comment() {
                break;
            }
        }
    }

    /// Match a comment (`# ...` or `-- ...`) up to and including the end of the line
    fn comment(&mut self) -> bool {
        if !self.lit("#") && !self.lit("--") {
            return false;
        }

        loop {
            if self.newline() || self.at_end() {
                return true;
            }

            // Not at the end, so a character is always available
            self.any_char();
        }
    }

    /// Match a line terminator
    pub(super) fn newline(&mut self) -> bool {
        self.lit("\r\n") || self.class("line break", is_newline).is_some()
    }

    /// Match a string, then skip whitespaces
    pub(super) fn token(&mut self, expected: &str) -> bool {
        if !self.lit(expected) {
            return false;
        }

        self.ws();
        true
    }

    /// Match one of the provided strings, then skip whitespaces
    pub(super) fn one_of_tokens(&mut self, candidates: &[&str]) -> bool {
        candidates.iter().any(|candidate| self.lit(candidate)) && {
            self.ws();
            true
        }
    }

    /// Match a keyword that is not the beginning of a longer name, then skip whitespaces
    pub(super) fn keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos();

        if self.raw_keyword(keyword) {
            self.ws();
            true
        } else {
            self.rewind(start);
            false
        }
    }

    /// Match a keyword that is not the beginning of a longer name
    fn raw_keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos();

        if self.lit(keyword)
            && self.not_ahead(|p| p.class("identifier character", is_ident_char).is_some())
        {
            return true;
        }

        self.rewind(start);
        false
    }

    /// Match a lowercase identifier (variables, entry points), then skip whitespaces
    pub(super) fn lower_ident(&mut self) -> Option<String> {
        let start = self.pos();

        self.class("lowercase identifier", is_lower_ident_start)?;
        while self.class("lowercase identifier", is_lower_ident_char).is_some() {}

        let name = self.slice_from(start).to_string();
        self.ws();
        Some(name)
    }

    /// Match the name of an entry point, which must be a valid function name, then skip whitespaces
    pub(super) fn entry_ident(&mut self) -> Option<String> {
        let start = self.pos();

        self.class("entry point name", is_entry_ident_start)?;
        while self.class("entry point name", is_entry_ident_char).is_some() {}

        let name = self.slice_from(start).to_string();
        self.ws();
        Some(name)
    }

    /// Match a variable's name, optionally surrounded by parentheses
    pub(super) fn var_name(&mut self) -> Option<String> {
        if let Some(name) = self.lower_ident() {
            return Some(name);
        }

        let start = self.pos();

        if self.token("(") {
            if let Some(name) = self.lower_ident() {
                if self.token(")") {
                    return Some(name);
                }
            }
        }

        self.rewind(start);
        None
    }

    /// Match a rule's name, plain (`some-rule`) or back-quoted (`` `some rule` ``)
    ///
    /// Back quotes are not part of the returned name.
    pub(super) fn rule_name(&mut self) -> Option<String> {
        let start = self.pos();

        let is_keyword = !self.not_ahead(|p| KEYWORDS.iter().any(|keyword| p.raw_keyword(keyword)));

        if is_keyword {
            return None;
        }

        if self.class("identifier", is_rule_name_start).is_some() {
            while self.class("identifier character", is_ident_char).is_some() {}

            let name = self.slice_from(start).to_string();
            self.ws();
            return Some(name);
        }

        if self.lit("`") {
            let name_start = self.pos();

            loop {
                let name_end = self.pos();

                if self.lit("`") {
                    let name = self.slice(name_start, name_end).to_string();
                    self.ws();
                    return Some(name);
                }

                if self.any_char().is_none() {
                    break;
                }
            }
        }

        self.rewind(start);
        None
    }

    /// Match a string literal (`'...'`, `"..."` or `U+XXXX`), then skip whitespaces
    pub(super) fn string_literal(&mut self) -> Result<Option<String>, CompileError> {
        let start = self.pos();

        for quote in ["'", "\""] {
            if !self.lit(quote) {
                continue;
            }

            let content_start = self.pos();

            loop {
                let content_end = self.pos();

                if self.lit(quote) {
                    let content = self.slice(content_start, content_end).to_string();
                    self.ws();
                    return Ok(Some(content));
                }

                if self.any_char().is_none() {
                    self.rewind(start);
                    return Ok(None);
                }
            }
        }

        if self.lit("U+") {
            let digits_start = self.pos();

            if self.class("hexadecimal digit", is_hex_digit).is_some() {
                while self.class("hexadecimal digit", is_hex_digit).is_some() {}

                let digits = self.slice_from(digits_start);
                let code = u32::from_str_radix(digits, 16).unwrap_or(u32::MAX);

                let c = char::from_u32(code).ok_or_else(|| {
                    CompileError::new(start, CompileErrorContent::UnsupportedCodePoint(code))
                })?;

                self.ws();
                return Ok(Some(c.to_string()));
            }

            self.rewind(start);
        }

        Ok(None)
    }

    /// Match a code block, either balanced (`{ ... }`) or multi-line (`{... ...}`), then skip whitespaces
    ///
    /// The returned snippet does not include the delimiters.
    pub(super) fn action_block(&mut self) -> Option<Snippet> {
        let start = self.pos();

        if let Some(code) = self.multi_line_block() {
            self.ws();
            return Some(Snippet::new(code, start));
        }

        self.rewind(start);

        if self.balanced_braces() {
            let code = self.slice(start + 1, self.pos() - 1).to_string();
            self.ws();
            return Some(Snippet::new(code, start));
        }

        self.rewind(start);
        None
    }

    /// Match `{...` followed by code and a closing `...}` (or `}...`)
    fn multi_line_block(&mut self) -> Option<String> {
        if !self.lit("{") {
            return None;
        }

        while self.class("whitespace", is_whitespace).is_some() {}

        if !self.lit("...") {
            return None;
        }

        // Blank rest of the opening line
        let after_opening = self.pos();

        loop {
            if self.newline() {
                break;
            }

            if self.class("whitespace", is_whitespace).is_none() {
                self.rewind(after_opening);
                break;
            }
        }

        let code_start = self.pos();

        loop {
            let code_end = self.pos();

            if self.multi_line_terminator() {
                return Some(self.slice(code_start, code_end).to_string());
            }

            self.any_char()?;
        }
    }

    /// Match `...}` or `}...`, with optional whitespaces in between
    fn multi_line_terminator(&mut self) -> bool {
        let start = self.pos();

        if self.lit("...") {
            while self.class("whitespace", is_whitespace).is_some() {}

            if self.lit("}") {
                return true;
            }

            self.rewind(start);
        }

        if self.lit("}") {
            while self.class("whitespace", is_whitespace).is_some() {}

            if self.lit("...") {
                return true;
            }

            self.rewind(start);
        }

        false
    }

    /// Match a block of balanced braces
    fn balanced_braces(&mut self) -> bool {
        let start = self.pos();

        if !self.lit("{") {
            return false;
        }

        loop {
            let before = self.pos();

            if self.lit("}") {
                return true;
            }

            if self.balanced_braces() {
                continue;
            }

            self.rewind(before);

            if self.any_char().is_none() {
                self.rewind(start);
                return false;
            }
        }
    }
}
