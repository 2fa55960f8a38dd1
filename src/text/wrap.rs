use crate::foundation::error::{ClipError, ClipResult};
use crate::text::measure::TextMeasure;

/// Greedy word wrap of `text` into lines no wider than `max_width_px`.
///
/// Words are whitespace-separated. A word is appended to the current line while the measured
/// width of `current + " " + word` stays within budget; otherwise the current line is emitted and
/// the word starts a new one. A single word wider than the budget is placed alone on its line,
/// unsplit. Empty or all-whitespace input yields no lines.
pub fn wrap_lines(
    text: &str,
    max_width_px: f32,
    measure: &mut dyn TextMeasure,
) -> ClipResult<Vec<String>> {
    if !max_width_px.is_finite() || max_width_px <= 0.0 {
        return Err(ClipError::layout("wrap width must be finite and > 0"));
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure.measure(&candidate)? > max_width_px {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
