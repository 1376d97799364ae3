use super::*;
use crate::model::slide::{ExportFormat, Resolution};
use std::path::PathBuf;

const PROJECT: &str = r#"
{
  "slides": [
    { "id": "a", "code": "let a = 1;", "language": "rust", "duration": 1.5 },
    { "id": "b", "code": "let a = 2;", "title": "Bump", "language": "rust", "duration": 2 }
  ],
  "settings": { "fps": 24, "resolution": "720p", "export_format": "gif" },
  "editor": { "font_path": "fonts/mono.ttf", "font_size": 18 }
}
"#;

#[test]
fn parses_and_validates() {
    let p = Project::from_reader(PROJECT.as_bytes()).unwrap();
    p.validate().unwrap();
    assert_eq!(p.slides.len(), 2);
    assert_eq!(p.slides[1].title, "Bump");
    assert_eq!(p.slides[0].title, "");
    assert_eq!(p.settings.fps, 24);
    assert_eq!(p.settings.resolution, Resolution::Hd720);
    assert_eq!(p.settings.export_format, ExportFormat::Gif);
    assert_eq!(p.editor.font_size, 18.0);
    assert!(p.editor.show_background);
}

#[test]
fn duplicate_ids_are_rejected() {
    let json = r#"{ "slides": [
        { "id": "a", "code": "", "duration": 1 },
        { "id": "a", "code": "", "duration": 1 } ] }"#;
    let p = Project::from_reader(json.as_bytes()).unwrap();
    assert!(p.validate().is_err());
}

#[test]
fn malformed_json_is_a_validation_error() {
    let err = Project::from_reader("{ nope".as_bytes()).unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
}

#[test]
fn relative_font_paths_resolve_against_base() {
    let mut p = Project::from_reader(PROJECT.as_bytes()).unwrap();
    p.resolve_paths(Path::new("/projects/demo"));
    assert_eq!(
        p.editor.font_path,
        Some(PathBuf::from("/projects/demo/fonts/mono.ttf"))
    );
}

#[test]
fn missing_file_reports_path() {
    let err = Project::from_path("does/not/exist.json").unwrap_err();
    assert!(err.to_string().contains("does/not/exist.json"));
}
