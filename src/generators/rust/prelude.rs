use crate::runtime::{EXPECTED_ANY_CHAR, EXPECTED_BEGINNING, EXPECTED_END};
use proc_macro2::TokenStream;
use quote::quote;

/// Generate the items every parser relies on
///
/// The generated module is self-contained: it carries its own copy of the semantic values, syntax
/// errors and parsing context instead of depending on this crate.
pub(super) fn gen_prelude() -> TokenStream {
    let values = gen_values();
    let errors = gen_errors();
    let context = gen_context();
    let location = gen_location();

    quote! {
        #values
        #errors
        #context
        #location
    }
}

fn gen_values() -> TokenStream {
    quote! {
        /// Semantic value produced by a successful match
        #[derive(Debug, Clone, PartialEq, Default)]
        pub enum Value {
            #[default]
            Nil,
            Bool(bool),
            Char(char),
            Str(String),
            Pos(usize),
            List(Vec<Value>),
        }

        #[allow(dead_code)]
        impl Value {
            pub fn is_nil(&self) -> bool {
                matches!(self, Value::Nil)
            }

            pub fn as_str(&self) -> Option<&str> {
                match self {
                    Value::Str(text) => Some(text),
                    _ => None,
                }
            }

            pub fn as_list(&self) -> Option<&[Value]> {
                match self {
                    Value::List(items) => Some(items),
                    _ => None,
                }
            }

            pub fn into_option(self) -> Option<Value> {
                match self {
                    Value::Nil => None,
                    value => Some(value),
                }
            }

            pub fn append(&mut self, value: Value) {
                let current = ::std::mem::take(self);

                *self = match (current, value) {
                    (Value::Nil, Value::Char(c)) => Value::Str(c.to_string()),
                    (Value::Nil, Value::Str(text)) => Value::Str(text),
                    (Value::Nil, other) => Value::List(vec![other]),
                    (Value::Str(mut text), Value::Str(more)) => {
                        text.push_str(&more);
                        Value::Str(text)
                    }
                    (Value::Str(mut text), Value::Char(c)) => {
                        text.push(c);
                        Value::Str(text)
                    }
                    (Value::List(mut items), other) => {
                        items.push(other);
                        Value::List(items)
                    }
                    (current, other) => Value::List(vec![current, other]),
                };
            }
        }

        impl ::std::fmt::Display for Value {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    Value::Nil => Ok(()),
                    Value::Bool(b) => write!(f, "{}", b),
                    Value::Char(c) => write!(f, "{}", c),
                    Value::Str(text) => write!(f, "{}", text),
                    Value::Pos(pos) => write!(f, "{}", pos),
                    Value::List(items) => items.iter().try_for_each(|item| write!(f, "{}", item)),
                }
            }
        }

        impl From<bool> for Value {
            fn from(b: bool) -> Self {
                Value::Bool(b)
            }
        }

        impl From<char> for Value {
            fn from(c: char) -> Self {
                Value::Char(c)
            }
        }

        impl From<&str> for Value {
            fn from(text: &str) -> Self {
                Value::Str(text.to_string())
            }
        }

        impl From<String> for Value {
            fn from(text: String) -> Self {
                Value::Str(text)
            }
        }

        impl From<usize> for Value {
            fn from(pos: usize) -> Self {
                Value::Pos(pos)
            }
        }

        impl From<Vec<Value>> for Value {
            fn from(items: Vec<Value>) -> Self {
                Value::List(items)
            }
        }
    }
}

fn gen_errors() -> TokenStream {
    quote! {
        /// Error returned when an input does not match the grammar
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct SyntaxError {
            pub message: String,
            pub position: usize,
        }

        impl ::std::fmt::Display for SyntaxError {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.message)
            }
        }

        impl ::std::error::Error for SyntaxError {}

        #[derive(Clone)]
        struct FurthestError {
            pos: usize,
            expectations: Vec<&'static str>,
        }

        impl FurthestError {
            fn message(&self) -> String {
                let mut unique: Vec<&str> = Vec::new();

                for expectation in self.expectations.iter().copied() {
                    if !unique.contains(&expectation) {
                        unique.push(expectation);
                    }
                }

                match unique.split_last() {
                    None => String::from("syntax error"),
                    Some((last, [])) => format!("{} is expected", last),
                    Some((last, head)) => format!("{} or {} is expected", head.join(", "), last),
                }
            }
        }
    }
}

fn gen_context() -> TokenStream {
    quote! {
        struct Context<'a> {
            input: &'a str,
            pos: usize,
            worst_error: Option<FurthestError>,
        }

        #[allow(dead_code)]
        impl<'a> Context<'a> {
            fn new(input: &'a str) -> Self {
                Self {
                    input,
                    pos: 0,
                    worst_error: None,
                }
            }

            fn pos(&self) -> usize {
                self.pos
            }

            fn set_pos(&mut self, pos: usize) {
                self.pos = pos;
            }

            fn expect(&mut self, pos: usize, expectation: &'static str) {
                let replace = match &self.worst_error {
                    Some(worst) => pos > worst.pos,
                    None => true,
                };

                if replace {
                    self.worst_error = Some(FurthestError {
                        pos,
                        expectations: vec![expectation],
                    });
                } else if let Some(worst) = &mut self.worst_error {
                    if worst.pos == pos {
                        worst.expectations.push(expectation);
                    }
                }
            }

            fn snapshot(&self) -> Option<FurthestError> {
                self.worst_error.clone()
            }

            fn restore(&mut self, snapshot: Option<FurthestError>) {
                self.worst_error = snapshot;
            }

            fn read_char(&mut self) -> Option<char> {
                let c = self.input[self.pos..].chars().next()?;
                self.pos += c.len_utf8();
                Some(c)
            }

            fn string(&mut self, expected: &str, shown: &'static str) -> Option<Value> {
                if self.input[self.pos..].starts_with(expected) {
                    self.pos += expected.len();
                    Some(Value::Str(expected.to_string()))
                } else {
                    self.expect(self.pos, shown);
                    None
                }
            }

            fn char_range(&mut self, from: char, to: char, shown: &'static str) -> Option<Value> {
                let start = self.pos;

                match self.read_char() {
                    Some(c) if from <= c && c <= to => Some(Value::Char(c)),
                    _ => {
                        self.pos = start;
                        self.expect(start, shown);
                        None
                    }
                }
            }

            fn any_char(&mut self) -> Option<Value> {
                match self.read_char() {
                    Some(c) => Some(Value::Char(c)),
                    None => {
                        self.expect(self.pos, #EXPECTED_ANY_CHAR);
                        None
                    }
                }
            }

            fn begin(&mut self) -> Option<Value> {
                if self.pos == 0 {
                    Some(Value::Nil)
                } else {
                    self.expect(self.pos, #EXPECTED_BEGINNING);
                    None
                }
            }

            fn end(&mut self) -> Option<Value> {
                if self.pos == self.input.len() {
                    Some(Value::Nil)
                } else {
                    self.expect(self.pos, #EXPECTED_END);
                    None
                }
            }

            fn take_since(&self, start: usize) -> &'a str {
                &self.input[start..self.pos]
            }

            fn into_error(self) -> SyntaxError {
                match self.worst_error {
                    Some(worst) => SyntaxError {
                        message: worst.message(),
                        position: worst.pos,
                    },
                    None => SyntaxError {
                        message: String::from("syntax error"),
                        position: self.pos,
                    },
                }
            }
        }
    }
}

fn gen_location() -> TokenStream {
    quote! {
        /// Convert a byte offset of an input into a line and column, both starting at 1
        ///
        /// Returns `None` if the offset is past the end of the input or does not fall at the beginning of a character.
        #[allow(dead_code)]
        pub fn line_and_column(input: &str, position: usize) -> Option<(usize, usize)> {
            let mut line = 1;
            let mut column = 1;
            let mut current = 0;

            loop {
                if current == position {
                    return Some((line, column));
                }

                let rest = input.get(current..)?;

                match yy_newline_length(rest) {
                    0 => {
                        let c = rest.chars().next()?;
                        current += c.len_utf8();
                        column += 1;
                    }
                    len => {
                        current += len;
                        line += 1;
                        column = 1;
                    }
                }
            }
        }

        fn yy_newline_length(input: &str) -> usize {
            if input.starts_with("\r\n") {
                return 2;
            }

            match input.chars().next() {
                Some(c @ ('\r' | '\n' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}')) => c.len_utf8(),
                _ => 0,
            }
        }
    }
}
