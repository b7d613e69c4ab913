use super::*;

#[test]
fn to_hex_pads_each_channel_to_two_digits() {
    assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203");
    assert_eq!(Color::rgb(255, 0, 171).to_hex(), "#ff00ab");
}

#[test]
fn to_hex_ignores_alpha() {
    assert_eq!(Color::rgba(16, 32, 48, 7).to_hex(), "#102030");
}

#[test]
fn display_matches_hex() {
    assert_eq!(Color::rgb(0xab, 0xcd, 0xef).to_string(), "#abcdef");
}

#[test]
fn from_hex_six_digits() {
    let c = Color::from_hex("#3a7bd5").expect("parse");
    assert_eq!(c, Color::rgb(0x3a, 0x7b, 0xd5));
}

#[test]
fn from_hex_short_form_expands_nibbles() {
    let c: Color = "#f0a".parse().expect("parse");
    assert_eq!(c, Color::rgb(0xff, 0x00, 0xaa));
}

#[test]
fn from_hex_with_alpha() {
    let c = Color::from_hex("00000080").expect("parse");
    assert_eq!(c.a, 0x80);
}

#[test]
fn from_hex_rejects_garbage() {
    assert!(matches!(Color::from_hex("#12"), Err(EngineError::Configuration(_))));
    assert!(matches!(Color::from_hex("#zzzzzz"), Err(EngineError::Configuration(_))));
}

#[test]
fn to_css_formats_alpha_fraction() {
    assert_eq!(Color::rgb(1, 2, 3).to_css(), "rgba(1, 2, 3, 1.000)");
}

#[test]
fn pixel_sample_uses_first_pixel() {
    let data = [10, 20, 30, 255, 99, 99, 99, 99];
    let s = PixelSample::from_rgba(&data, 2, 1);
    assert_eq!((s.red, s.green, s.blue, s.alpha), (10, 20, 30, 255));
    assert_eq!((s.width, s.height), (2, 1));
    assert_eq!(s.hex, "#0a141e");
}

#[test]
fn pixel_sample_of_empty_region_is_black() {
    let s = PixelSample::from_rgba(&[], 0, 0);
    assert_eq!(s.hex, "#000000");
    assert_eq!(s.color(), Color::TRANSPARENT);
}
