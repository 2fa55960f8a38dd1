use super::*;
use crate::text::font::FontBook;

fn system_engine() -> Option<TextLayoutEngine> {
    let bytes = FontBook::system().resolve("sans-serif")?;
    TextLayoutEngine::new(bytes).ok()
}

fn heavier_than_face(line: &ShapedLine) -> bool {
    line.layout.lines().flat_map(|l| l.items()).any(|item| {
        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
            return false;
        };
        let synthesis = run.run().synthesis();
        synthesis.embolden() || !synthesis.variation_settings().is_empty()
    })
}

#[test]
fn bold_weight_reaches_the_shaped_runs() {
    let Some(mut engine) = system_engine() else {
        eprintln!("skipping: no system sans-serif font");
        return;
    };
    let brush = TextBrushRgba8::default();
    let regular = engine
        .shape_line("ClipNova", 16.0, parley::style::FontWeight::NORMAL, brush)
        .unwrap();
    let bold = engine
        .shape_line("Hello world", 36.0, parley::style::FontWeight::BOLD, brush)
        .unwrap();

    assert!(!heavier_than_face(&regular));
    assert!(heavier_than_face(&bold));
    assert!(bold.width > 0.0);
}

#[test]
fn non_positive_size_is_a_layout_error() {
    let Some(mut engine) = system_engine() else {
        eprintln!("skipping: no system sans-serif font");
        return;
    };
    let err = engine
        .shape_line(
            "x",
            0.0,
            parley::style::FontWeight::BOLD,
            TextBrushRgba8::default(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, ClipError::Layout(_)));
}
