use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FlowvizError::image_format(3, "x")
            .to_string()
            .contains("image format error")
    );
    assert!(
        FlowvizError::vector_format("x")
            .to_string()
            .contains("vector format error")
    );
    assert!(
        FlowvizError::load("a.ppm", "x")
            .to_string()
            .contains("load error for 'a.ppm'")
    );
    assert!(
        FlowvizError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FlowvizError::render("x")
            .to_string()
            .contains("render error:")
    );
}

#[test]
fn with_path_fills_missing_path_only() {
    let err = FlowvizError::image_format(11, "bit depth").with_path("d/frames/frame1.ppm");
    let FlowvizError::ImageFormat { path, offset, .. } = &err else {
        panic!("expected ImageFormat, got {err:?}");
    };
    assert_eq!(path.as_deref(), Some("d/frames/frame1.ppm"));
    assert_eq!(*offset, 11);
    assert!(err.to_string().contains("d/frames/frame1.ppm"));

    let again = err.with_path("other.ppm");
    assert!(again.to_string().contains("d/frames/frame1.ppm"));

    let load = FlowvizError::load("a.json", "gone").with_path("b.json");
    assert!(load.to_string().contains("a.json"));
}

#[test]
fn unknown_path_renders_placeholder() {
    let err = FlowvizError::vector_format("eof");
    assert!(err.to_string().contains("<buffer>"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FlowvizError::from(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.clone().is_cancelled());
    assert!(FlowvizError::Cancelled.is_cancelled());
}
