use super::*;

#[test]
fn hold_frames_round_up() {
    let s = AnimationSlide::new("a", "x", "rust", 1.01);
    assert_eq!(s.hold_frames(30), 31);
    let s = AnimationSlide::new("a", "x", "rust", 2.0);
    assert_eq!(s.hold_frames(30), 60);
}

#[test]
fn resolution_presets() {
    assert_eq!(Resolution::Hd720.canvas().width, 1280);
    assert_eq!(Resolution::Hd720.canvas().height, 720);
    assert_eq!(Resolution::Hd1080.canvas().width, 1920);
    assert_eq!(Resolution::Hd1080.canvas().height, 1080);
}

#[test]
fn settings_parse_web_spellings() {
    let s: AnimationSettings = serde_json::from_str(
        r#"{ "fps": 24, "resolution": "720p", "transition_type": "fade", "export_format": "webm" }"#,
    )
    .unwrap();
    assert_eq!(s.fps, 24);
    assert_eq!(s.resolution, Resolution::Hd720);
    assert_eq!(s.transition_type, TransitionType::Fade);
    assert_eq!(s.export_format, ExportFormat::Webm);
}

#[test]
fn settings_defaults_fill_missing_fields() {
    let s: AnimationSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(s, AnimationSettings::default());
    assert_eq!(s.fps, 30);
}

#[test]
fn zero_fps_is_rejected() {
    let s = AnimationSettings {
        fps: 0,
        ..Default::default()
    };
    assert!(s.validate().is_err());
}

#[test]
fn slide_duration_must_be_positive() {
    assert!(AnimationSlide::new("a", "", "rust", 0.0).validate().is_err());
    assert!(
        AnimationSlide::new("a", "", "rust", f64::INFINITY)
            .validate()
            .is_err()
    );
    assert!(AnimationSlide::new("a", "", "rust", 0.5).validate().is_ok());
}

#[test]
fn export_format_metadata() {
    assert_eq!(ExportFormat::Gif.mime_type(), "image/gif");
    assert_eq!(ExportFormat::Webm.extension(), "webm");
    assert_eq!(ExportFormat::from_extension("MP4"), Some(ExportFormat::Mp4));
    assert_eq!(ExportFormat::from_extension("avi"), None);
}

#[test]
fn frame_counts_ignore_float_noise() {
    assert_eq!(frames_for_secs(0.2, 30), 6);
    assert_eq!(frames_for_secs(0.0, 30), 0);
    assert_eq!(frames_for_secs(0.7, 10), 7);
}

#[test]
fn checked_frame_counts_reject_unrepresentable_durations() {
    assert_eq!(checked_frames_for_secs(2.0, 30), Some(60));
    assert_eq!(checked_frames_for_secs(1e18, 30), None);
    assert_eq!(frames_for_secs(1e18, 30), u64::MAX);
    assert_eq!(checked_frames_for_secs(f64::INFINITY, 30), None);
}
