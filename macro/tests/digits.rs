use peg2rs_macro::peg_grammar;

#[peg_grammar(filename = "tests/grammars/digits.peg")]
mod digits {}

use digits::{SyntaxError, Value};

#[test]
fn first_rule_is_the_default_entry_point() {
    assert_eq!(digits::parse("42a"), Ok(Some(Value::from("42"))));
}

#[test]
fn exported_rules_get_their_own_function() {
    // `Digits` never assigns `val`
    assert_eq!(digits::Digits("42a"), Ok(None));
}

#[test]
fn stop_position_can_be_captured() {
    assert_eq!(digits::DigitsEnd("42a"), Ok(Some(Value::Pos(2))));
}

#[test]
fn reports_the_furthest_failure() {
    assert_eq!(
        digits::parse("a42"),
        Err(SyntaxError {
            message: "\"0\"...\"9\" is expected".to_string(),
            position: 0,
        })
    );

    assert_eq!(
        digits::Digits("").unwrap_err().to_string(),
        "\"0\"...\"9\" is expected"
    );
}

#[test]
fn converts_positions_to_lines_and_columns() {
    assert_eq!(digits::line_and_column("12\n34", 4), Some((2, 2)));
    assert_eq!(digits::line_and_column("12\r\n34", 3), None);
    assert_eq!(digits::line_and_column("12", 9), None);
}
