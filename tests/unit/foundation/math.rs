use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u16(100, 0), 0);
}

#[test]
fn lerp_endpoints_and_midpoint() {
    assert_eq!(lerp_u8(10, 200, 0.0), 10);
    assert_eq!(lerp_u8(10, 200, 1.0), 200);
    assert_eq!(lerp_u8(0, 100, 0.5), 50);
    assert_eq!(lerp_u8(0, 100, 4.0), 100);
    assert_eq!(lerp_u8(0, 100, f32::NAN), 0);
}

#[test]
fn saturate_scaled_caps_at_one() {
    assert!((saturate_scaled(0.1, 3.0) - 0.3).abs() < 1e-12);
    assert_eq!(saturate_scaled(0.5, 3.0), 1.0);
    assert_eq!(saturate_scaled(-1.0, 2.0), 0.0);
    assert_eq!(saturate_scaled(f64::INFINITY, 2.0), 0.0);
}
