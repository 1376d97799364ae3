use super::*;
use crate::model::slide::{AnimationSettings, AnimationSlide, Resolution};
use std::sync::Arc;

fn hold(code: &str) -> AnimationFrame {
    AnimationFrame::Slide {
        slide_index: 0,
        slide: Arc::new(AnimationSlide::new("a", code, "rust", 1.0)),
    }
}

fn settings() -> AnimationSettings {
    AnimationSettings {
        resolution: Resolution::Hd720,
        ..Default::default()
    }
}

#[test]
fn capture_before_render_is_a_capture_error() {
    let mut r = CpuRenderer::new();
    let err = r.capture(Resolution::Hd720.canvas()).unwrap_err();
    assert!(matches!(err, MorphError::Capture(_)));
}

#[test]
fn missing_font_file_is_a_validation_error() {
    let mut r = CpuRenderer::new();
    let editor = EditorSettings {
        font_path: Some(PathBuf::from("/definitely/not/here.ttf")),
        ..Default::default()
    };
    let req = RenderRequest {
        settings: &settings(),
        editor: &editor,
    };
    let err = r.render(&hold("x"), &req).unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
    assert!(err.to_string().contains("here.ttf"));
}

#[test]
fn canvas_dims_reject_empty_and_oversized() {
    assert!(canvas_dims(Canvas {
        width: 0,
        height: 10
    })
    .is_err());
    assert!(canvas_dims(Canvas {
        width: 70_000,
        height: 10
    })
    .is_err());
    assert_eq!(
        canvas_dims(Canvas {
            width: 1280,
            height: 720
        })
        .unwrap(),
        (1280, 720)
    );
}

#[test]
fn renders_background_and_text_with_a_system_font() {
    let Some(font) = find_system_font() else {
        return;
    };
    let editor = EditorSettings {
        font_path: Some(font),
        ..Default::default()
    };
    let settings = settings();
    let req = RenderRequest {
        settings: &settings,
        editor: &editor,
    };
    let mut r = CpuRenderer::new();
    r.render(&hold("fn main() {}"), &req).unwrap();

    let canvas = Resolution::Hd720.canvas();
    let frame = r.capture(canvas).unwrap();
    assert_eq!(frame.canvas(), canvas);
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), canvas.rgba_len());
    let bg = Theme::dark().background;
    assert_eq!(&frame.data[..4], &bg[..]);
    assert!(
        frame.data.chunks_exact(4).any(|px| px != bg),
        "expected some text pixels"
    );

    let err = r
        .capture(Canvas {
            width: 1920,
            height: 1080,
        })
        .unwrap_err();
    assert!(matches!(err, MorphError::Capture(_)));
}

#[test]
fn transparent_background_when_disabled() {
    let Some(font) = find_system_font() else {
        return;
    };
    let editor = EditorSettings {
        font_path: Some(font),
        show_background: false,
        ..Default::default()
    };
    let settings = settings();
    let req = RenderRequest {
        settings: &settings,
        editor: &editor,
    };
    let mut r = CpuRenderer::new();
    r.render(&hold("x"), &req).unwrap();
    let frame = r.capture(Resolution::Hd720.canvas()).unwrap();
    assert_eq!(&frame.data[..4], &[0, 0, 0, 0]);
}
