use peg2rs_macro::peg_grammar;

#[peg_grammar(filename = "tests/grammars/words.peg")]
pub mod words {}

use words::Value;

#[test]
fn lazy_repetition_stops_before_what_follows() {
    assert_eq!(words::parse("hi there"), Ok(Some(Value::from("hi"))));
}

#[test]
fn lazy_repetition_requires_its_follow() {
    let err = words::parse("hi").unwrap_err();

    assert_eq!(err.position, 2);
    assert!(err.message.contains("\" \""), "{}", err.message);
}

#[test]
fn captured_sequences_have_no_value() {
    assert_eq!(words::Grouped("hi there"), Ok(None));
    assert!(words::Grouped("hi").is_err());
}

#[test]
fn repeated_runs_give_the_same_result() {
    let first = words::Words("one two  three");
    let second = words::Words("one two  three");

    assert_eq!(first, Ok(Some(Value::from("onetwothree"))));
    assert_eq!(first, second);
    assert_eq!(words::parse("hi there"), words::parse("hi there"));
}

#[test]
fn appended_text_captures_are_concatenated() {
    assert_eq!(words::Words("hi  there "), Ok(Some(Value::from("hithere"))));
    assert_eq!(words::Words(""), Ok(None));
}

#[test]
fn restored_positions_allow_reading_again() {
    assert_eq!(words::Twice("aaa"), Ok(Some(Value::from("aaa"))));
}
