use super::*;

#[test]
fn default_config_targets_black_hole() {
    let cfg = VisualizerConfig::default();
    assert_eq!(cfg.dataset, "black-hole");
    assert_eq!(cfg.meta.frame_count, 659);
    assert_eq!(cfg.frame_extension, "ppm");
    assert_eq!(cfg.options, RenderOptions::default());
    cfg.validate().unwrap();
}

#[test]
fn from_registry_resolves_metadata() {
    let opts = RenderOptions {
        arrows: true,
        ..RenderOptions::default()
    };
    let cfg = VisualizerConfig::from_registry(&DatasetRegistry::builtin(), "bird", opts).unwrap();
    assert_eq!(cfg.meta.video_duration_ms, 9000);
    assert!(cfg.options.arrows);
    assert_eq!(cfg.layout().frame_path(248), "bird/frames/frame248.ppm");
}

#[test]
fn unknown_dataset_is_validation_error() {
    let err =
        VisualizerConfig::from_registry(&DatasetRegistry::builtin(), "cat", RenderOptions::default())
            .unwrap_err();
    assert!(matches!(err, FlowvizError::Validation(_)));
}

#[test]
fn bad_extension_is_rejected() {
    let mut cfg = VisualizerConfig::default();
    cfg.frame_extension = "../ppm".to_owned();
    assert!(cfg.validate().is_err());
    cfg.frame_extension = String::new();
    assert!(cfg.validate().is_err());
}

#[test]
fn config_json_fills_defaults() {
    let cfg: VisualizerConfig = serde_json::from_str(
        r#"{"dataset": "bird", "meta": {"frame_count": 248, "video_duration_ms": 9000},
            "options": {"stacked": true}}"#,
    )
    .unwrap();
    assert!(cfg.options.stacked);
    assert!(!cfg.options.debug);
    assert_eq!(cfg.frame_extension, "ppm");
}
