/// Is a character a whitespace in grammar sources?
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'..='\r'
            | ' '
            | '\u{85}'
            | '\u{A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Can a character start a rule's name?
pub fn is_rule_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

/// Can a character continue a rule's name?
///
/// Keywords must not be followed by such a character to be recognized.
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Can a character start a variable's name?
pub fn is_lower_ident_start(c: char) -> bool {
    c.is_ascii_lowercase() || c == '_'
}

/// Can a character continue a variable's name?
pub fn is_lower_ident_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

/// Can a character start an entry point's name?
pub fn is_entry_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Can a character continue an entry point's name?
pub fn is_entry_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Is a character an uppercase hexadecimal digit (used by `U+XXXX` literals)?
pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_digit() || ('A'..='F').contains(&c)
}

/// Words that cannot be used as rule names
pub static KEYWORDS: &[&str] = &["char", "at"];

/// Operators separating the two ends of a character range, longest first
pub static RANGE_OPERATORS: &[&str] = &["...", "..", "…", "‥"];

/// Operators separating a rule's header from its body
pub static ARROWS: &[&str] = &["<-", "=", "←"];

/// Name of the function generated for the first rule
pub const DEFAULT_ENTRY_POINT: &str = "parse";

/// Prefix reserved for the generated parser's internal items
pub const RESERVED_PREFIX: &str = "yy_";

/// Public functions of the generated parser that entry points cannot shadow
pub static RESERVED_ENTRY_POINTS: &[&str] = &["line_and_column", "_", "self", "super", "crate"];
