use super::*;
use crate::text::measure::FixedAdvance;

fn fixed(advance_px: f32) -> FixedAdvance {
    FixedAdvance { advance_px }
}

#[test]
fn short_text_stays_on_one_line() {
    let lines = wrap_lines("Hello world", 620.0, &mut fixed(10.0)).unwrap();
    assert_eq!(lines, vec!["Hello world".to_string()]);
}

#[test]
fn wraps_greedily_at_budget() {
    // 10 px per char, 50 px budget => at most 5 chars per line.
    let lines = wrap_lines("aa bb cc ddd e", 50.0, &mut fixed(10.0)).unwrap();
    assert_eq!(lines, vec!["aa bb", "cc", "ddd e"]);
}

#[test]
fn exact_fit_is_within_budget() {
    let lines = wrap_lines("abcd e", 60.0, &mut fixed(10.0)).unwrap();
    assert_eq!(lines, vec!["abcd e"]);
}

#[test]
fn overlong_word_sits_alone_unsplit() {
    let lines = wrap_lines("hi supercalifragilistic yo", 50.0, &mut fixed(10.0)).unwrap();
    assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
}

#[test]
fn empty_and_whitespace_input_yields_nothing() {
    assert!(wrap_lines("", 100.0, &mut fixed(10.0)).unwrap().is_empty());
    assert!(wrap_lines("  \t\n ", 100.0, &mut fixed(10.0)).unwrap().is_empty());
}

#[test]
fn repeated_spaces_collapse() {
    let lines = wrap_lines("a   b", 100.0, &mut fixed(10.0)).unwrap();
    assert_eq!(lines, vec!["a b"]);
}

#[test]
fn invalid_budget_is_a_layout_error() {
    let err = wrap_lines("a b", 0.0, &mut fixed(10.0)).unwrap_err();
    assert!(matches!(err, ClipError::Layout(_)));
    assert!(wrap_lines("a b", f32::NAN, &mut fixed(10.0)).is_err());
}

#[test]
fn measurement_failure_propagates() {
    let mut failing = |_: &str| -> ClipResult<f32> { Err(ClipError::layout("no metrics")) };
    let err = wrap_lines("a b c", 100.0, &mut failing).unwrap_err();
    assert!(matches!(err, ClipError::Layout(_)));
}

#[test]
fn lines_respect_budget_for_many_inputs() {
    let texts = [
        "The quick brown fox jumps over the lazy dog",
        "one",
        "a b c d e f g h i j k l m n o p",
        "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod",
        "x yy zzz wwww vvvvv uuuuuu ttttttt ssssssss",
    ];
    let advance = 7.0f32;
    for budget in [7.0f32, 20.0, 49.0, 100.0, 333.0] {
        for text in texts {
            let lines = wrap_lines(text, budget, &mut fixed(advance)).unwrap();
            let joined = lines.join(" ");
            assert_eq!(joined, text.split_whitespace().collect::<Vec<_>>().join(" "));
            for line in &lines {
                let w = line.chars().count() as f32 * advance;
                let single_word = !line.contains(' ');
                assert!(
                    w <= budget || single_word,
                    "line {line:?} ({w}px) exceeds {budget}px"
                );
            }
        }
    }
}

#[test]
fn wrap_is_restartable() {
    let text = "deterministic wrapping across repeated calls";
    let a = wrap_lines(text, 120.0, &mut fixed(9.0)).unwrap();
    let b = wrap_lines(text, 120.0, &mut fixed(9.0)).unwrap();
    assert_eq!(a, b);
}
