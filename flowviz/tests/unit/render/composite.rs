use super::*;
use crate::foundation::core::Rgba8;

fn px(r: u8, g: u8, b: u8, a: u8) -> Rgba8Premul {
    Rgba8Premul { r, g, b, a }
}

#[test]
fn opaque_layer_pixel_replaces_committed() {
    assert_eq!(src_over(px(10, 20, 30, 255), px(1, 2, 3, 255)), px(1, 2, 3, 255));
}

#[test]
fn empty_layer_pixel_keeps_committed() {
    assert_eq!(
        src_over(px(10, 20, 30, 255), Rgba8Premul::transparent()),
        px(10, 20, 30, 255)
    );
}

#[test]
fn trail_fade_over_black_lightens_slightly() {
    let fade = Rgba8::new(255, 255, 255, 26).premultiply();
    assert_eq!(src_over(px(0, 0, 0, 255), fade), px(26, 26, 26, 255));
}

#[test]
fn trail_fade_over_transparent_accumulates_alpha() {
    let fade = px(26, 26, 26, 26);
    let once = src_over(Rgba8Premul::transparent(), fade);
    assert_eq!(once, fade);
    let twice = src_over(once, fade);
    assert!(twice.a > once.a);
    assert!(twice.r <= twice.a);
}

#[test]
fn half_covered_stroke_mixes_with_committed() {
    // 50% red over opaque blue.
    let out = src_over(px(0, 0, 255, 255), px(128, 0, 0, 128));
    assert_eq!(out, px(128, 0, 127, 255));
}

#[test]
fn composite_layer_rejects_mismatched_buffers() {
    let mut committed = vec![0u8; 8];
    assert!(composite_layer(&mut committed, &[0u8; 4]).is_err());
    assert!(composite_layer(&mut committed, &[255u8; 8]).is_ok());
    assert_eq!(committed, vec![255u8; 8]);
}

#[test]
fn composite_layer_blends_each_pixel() {
    let mut committed = vec![0, 0, 0, 255, 9, 9, 9, 255];
    let layer = [26, 26, 26, 26, 0, 0, 0, 0];
    composite_layer(&mut committed, &layer).unwrap();
    assert_eq!(committed, vec![26, 26, 26, 255, 9, 9, 9, 255]);
}
