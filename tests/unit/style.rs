use super::*;

#[test]
fn known_styles_resolve_to_their_animation() {
    assert_eq!(resolve_style("trendy").animation, AnimationKind::Fade);
    assert_eq!(resolve_style("funny").animation, AnimationKind::Slide);
    assert_eq!(resolve_style("educational").animation, AnimationKind::Zoom);
    assert_eq!(
        resolve_style("storytelling").animation,
        AnimationKind::Typewriter
    );
    assert_eq!(resolve_style("product").animation, AnimationKind::Fade);
}

#[test]
fn every_listed_name_round_trips() {
    for name in STYLE_NAMES {
        assert_eq!(resolve_style(name).name, name);
    }
}

#[test]
fn unknown_tokens_fall_back_to_default() {
    let default = StyleConfig::default_style();
    let long = "x".repeat(4096);
    for token in ["", "   ", "unknown", "default", "trendy!", "🎬", "\0", long.as_str()] {
        assert_eq!(resolve_style(token), default, "token {token:?}");
    }
}

#[test]
fn lookup_is_trimmed_and_case_insensitive() {
    assert_eq!(resolve_style("  TRENDY "), resolve_style("trendy"));
    assert_eq!(resolve_style("Funny"), resolve_style("funny"));
}

#[test]
fn trendy_colors_match_palette() {
    let s = resolve_style("trendy");
    assert_eq!(s.background, Rgba8::opaque(52, 152, 219));
    assert_eq!(s.gradient[0], Rgba8::rgba(52, 152, 219, 0.8));
    assert_eq!(s.gradient[1].a, 230);
}

#[test]
fn font_families_are_split_in_order() {
    let s = resolve_style("storytelling");
    let families: Vec<_> = s.font_families().collect();
    assert_eq!(families, vec!["Times New Roman", "serif"]);
}
