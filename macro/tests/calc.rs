use peg2rs_macro::peg_grammar;

#[peg_grammar(filename = "tests/grammars/calc.peg")]
mod calc {}

use calc::{SyntaxError, Value};

#[test]
fn actions_build_the_value() {
    assert_eq!(calc::parse("1 + 2+ 39"), Ok(Some(Value::from("42"))));
    assert_eq!(calc::parse(" 7 "), Ok(Some(Value::from("7"))));
}

#[test]
fn merges_expectations_at_the_same_position() {
    assert_eq!(
        calc::parse("1 + x"),
        Err(SyntaxError {
            message: "\" \" or \"0\"...\"9\" is expected".to_string(),
            position: 4,
        })
    );
}

#[test]
fn semantic_predicates_reject_matches() {
    assert_eq!(calc::Even("42"), Ok(Some(Value::Bool(true))));

    let err = calc::Even("7").unwrap_err();
    assert_eq!(err.position, 1);
}
