use std::fmt;

/// Semantic value produced by a successful match
///
/// Generated parsers carry an identical type in their prelude, so values built by the
/// [interpreter](super::execute) and by generated code compare the same way.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value, converted to "absent" at the entry point boundary
    #[default]
    Nil,

    /// Boolean, only produced by actions
    Bool(bool),

    /// Single character (character ranges and `char`)
    Char(char),

    /// Text (literals and text captures)
    Str(String),

    /// Cursor position (`@`)
    Pos(usize),

    /// Values of every iteration of a repetition, or appended captures
    List(Vec<Value>),
}

impl Value {
    /// Is this the "no value" placeholder?
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get the text if the value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Get the items if the value is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert the placeholder to `None`, any other value to `Some`
    pub fn into_option(self) -> Option<Value> {
        match self {
            Value::Nil => None,
            value => Some(value),
        }
    }

    /// Append a value, as done by the `:+` and `:>>` captures
    ///
    /// Text appended to nothing or to text is concatenated, anything appended to a list is pushed,
    /// other combinations turn into a two-item list.
    pub fn append(&mut self, value: Value) {
        let current = std::mem::take(self);

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

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appending_text_concatenates() {
        let mut value = Value::Nil;
        value.append(Value::Char('h'));
        value.append(Value::from("el"));
        value.append(Value::Char('l'));

        assert_eq!(value, Value::from("hell"));
    }

    #[test]
    fn appending_to_list_pushes() {
        let mut value = Value::Nil;
        value.append(Value::Pos(1));
        value.append(Value::from("x"));

        assert_eq!(value, Value::List(vec![Value::Pos(1), Value::from("x")]));
    }

    #[test]
    fn appending_non_text_to_text_builds_list() {
        let mut value = Value::from("a");
        value.append(Value::Bool(true));

        assert_eq!(value, Value::List(vec![Value::from("a"), Value::Bool(true)]));
    }

    #[test]
    fn nil_is_absent_but_false_is_present() {
        assert_eq!(Value::Nil.into_option(), None);
        assert_eq!(Value::Bool(false).into_option(), Some(Value::Bool(false)));
    }

    #[test]
    fn displays_nested_lists_as_text() {
        let value = Value::List(vec![
            Value::Char('a'),
            Value::List(vec![Value::from("bc"), Value::Nil]),
            Value::Pos(4),
        ]);

        assert_eq!(value.to_string(), "abc4");
    }
}
