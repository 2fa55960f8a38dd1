use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_conversions() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_floor(10.0), 300);
    assert!((fps.frames_to_secs(45) - 1.5).abs() < 1e-9);
}

#[test]
fn canvas_validation() {
    assert!(Canvas::PORTRAIT.validate().is_ok());
    assert!(
        Canvas {
            width: 0,
            height: 10
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 70_000,
            height: 10
        }
        .validate()
        .is_err()
    );
}

#[test]
fn hex_colors_parse() {
    assert_eq!(
        Rgba8::from_hex("#3498db").unwrap(),
        Rgba8::opaque(0x34, 0x98, 0xdb)
    );
    assert_eq!(Rgba8::from_hex("#00000080").unwrap().a, 0x80);
    assert!(Rgba8::from_hex("3498db").is_err());
    assert!(Rgba8::from_hex("#34").is_err());
    assert!(Rgba8::from_hex("#zz98db").is_err());
}

#[test]
fn rgba_alpha_is_clamped() {
    assert_eq!(Rgba8::rgba(1, 2, 3, 0.5).a, 128);
    assert_eq!(Rgba8::rgba(1, 2, 3, 7.0).a, 255);
    assert_eq!(Rgba8::rgba(1, 2, 3, f32::NAN).a, 0);
}

#[test]
fn premul_scales_channels() {
    assert_eq!(Rgba8::rgba(255, 255, 255, 0.0).premul(), [0, 0, 0, 0]);
    assert_eq!(Rgba8::WHITE.premul(), [255, 255, 255, 255]);
    let [r, _, _, a] = Rgba8::rgba(200, 0, 0, 0.5).premul();
    assert_eq!(a, 128);
    assert_eq!(r, 100);
}
