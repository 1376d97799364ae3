use super::*;

#[test]
fn mp4_prefers_streaming_h264() {
    let caps = EncoderCapabilities::with_encoders(["libx264", "mpeg4", "libvpx-vp9"]);
    assert_eq!(
        select_strategy(ExportFormat::Mp4, &caps).unwrap(),
        EncoderStrategy::StreamingVideo(VideoCodec::H264)
    );
}

#[test]
fn mp4_falls_back_to_recorded_mpeg4() {
    let caps = EncoderCapabilities::with_encoders(["mpeg4"]);
    assert_eq!(
        select_strategy(ExportFormat::Mp4, &caps).unwrap(),
        EncoderStrategy::RecordedVideo(VideoCodec::Mpeg4)
    );
}

#[test]
fn webm_is_recorded_vp9() {
    let caps = EncoderCapabilities::with_encoders(["libx264", "libvpx-vp9"]);
    assert_eq!(
        select_strategy(ExportFormat::Webm, &caps).unwrap(),
        EncoderStrategy::RecordedVideo(VideoCodec::Vp9)
    );
}

#[test]
fn gif_needs_no_runtime_support() {
    assert_eq!(
        select_strategy(ExportFormat::Gif, &EncoderCapabilities::default()).unwrap(),
        EncoderStrategy::Gif
    );
}

#[test]
fn missing_support_is_an_encoder_configuration_error() {
    let none = EncoderCapabilities::default();
    let err = select_strategy(ExportFormat::Mp4, &none).unwrap_err();
    assert!(matches!(err, MorphError::EncoderConfiguration(_)));
    assert!(err.to_string().contains("ffmpeg on PATH"));

    let x264_only = EncoderCapabilities::with_encoders(["libx264"]);
    assert!(matches!(
        select_strategy(ExportFormat::Webm, &x264_only),
        Err(MorphError::EncoderConfiguration(_))
    ));
}

#[test]
fn progress_caps_reserve_finalize_headroom() {
    assert_eq!(EncoderStrategy::Gif.capture_progress_cap(), 0.9);
    assert_eq!(
        EncoderStrategy::StreamingVideo(VideoCodec::H264).capture_progress_cap(),
        0.99
    );
}

#[test]
fn system_provider_builds_every_strategy() {
    let p = SystemEncoders::new();
    for s in [
        EncoderStrategy::StreamingVideo(VideoCodec::H264),
        EncoderStrategy::RecordedVideo(VideoCodec::Vp9),
        EncoderStrategy::Gif,
    ] {
        assert!(p.create(s).is_ok());
    }
}
