use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MorphError::encoder_configuration("x")
            .to_string()
            .contains("encoder configuration error:")
    );
    assert!(
        MorphError::capture("x")
            .to_string()
            .contains("capture error:")
    );
    assert!(MorphError::encode("x").to_string().contains("encode error:"));
    assert!(
        MorphError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MorphError::highlight("x")
            .to_string()
            .contains("highlight error:")
    );
}

#[test]
fn insufficient_slides_reports_count() {
    let err = MorphError::insufficient_slides(1);
    assert!(matches!(err, MorphError::InsufficientSlides { count: 1 }));
    assert!(err.to_string().contains("got 1"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MorphError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
