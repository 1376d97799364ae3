use super::*;
use crate::animation::ease::Ease;
use crate::animation::transition::generate_transition;
use crate::foundation::error::MorphResult;
use crate::highlight::{HighlightNode, PlainHighlighter};
use std::sync::atomic::{AtomicUsize, Ordering};

fn metrics() -> GlyphMetrics {
    GlyphMetrics::new(10.0, 20.0).unwrap()
}

/// Tags the whole text as `keyword` for language "kw"; unsupported otherwise.
#[derive(Clone, Default)]
struct KeywordOnly(Arc<AtomicUsize>);

impl Highlighter for KeywordOnly {
    fn highlight(&self, code: &str, language: &str) -> MorphResult<Option<Vec<HighlightNode>>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok((language == "kw").then(|| vec![HighlightNode::span("keyword", code)]))
    }
}

fn transition_frame(
    from: AnimationSlide,
    to: AnimationSlide,
    segments: u32,
    index: usize,
) -> AnimationFrame {
    let frame = generate_transition(Arc::new(from), Arc::new(to), 1000.0, segments, metrics())
        .unwrap()
        .with_ease(Ease::Linear)
        .nth(index)
        .unwrap();
    AnimationFrame::Transition {
        slide_index: 0,
        frame,
    }
}

fn glyph(scene: &Scene, ch: char) -> &GlyphInstance {
    scene.glyphs.iter().find(|g| g.ch == ch).unwrap()
}

#[test]
fn code_cells_skip_whitespace_and_carriage_returns() {
    let cells: Vec<_> = code_cells("a b\r\n c").collect();
    assert_eq!(
        cells,
        vec![
            ('a', Cell::new(0, 0)),
            ('b', Cell::new(0, 2)),
            ('c', Cell::new(1, 1)),
        ]
    );
}

#[test]
fn hold_frame_draws_every_visible_char_opaque() {
    let slide = Arc::new(AnimationSlide::new("a", "fn x\n  y", "rust", 1.0).with_title("Intro"));
    let frame = AnimationFrame::Slide {
        slide_index: 0,
        slide,
    };
    let theme = Theme::dark();
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(&frame, TransitionType::Diff, &mut cache, &theme, metrics());

    assert_eq!(scene.glyphs.len(), 4);
    assert!(scene.glyphs.iter().all(|g| g.opacity == 1.0));
    assert!(scene.glyphs.iter().all(|g| g.color == theme.plain));
    assert_eq!(glyph(&scene, 'y').position, Position::new(20.0, 20.0));
    assert_eq!(
        scene.titles,
        vec![TitleInstance {
            text: "Intro".into(),
            opacity: 1.0
        }]
    );
}

#[test]
fn diff_midpoint_fades_replaced_digit() {
    let frame = transition_frame(
        AnimationSlide::new("a", "let a = 1;", "rust", 1.0),
        AnimationSlide::new("b", "let a = 2;", "rust", 1.0),
        10,
        5,
    );
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(
        &frame,
        TransitionType::Diff,
        &mut cache,
        &Theme::dark(),
        metrics(),
    );

    let one = glyph(&scene, '1');
    let two = glyph(&scene, '2');
    assert!((one.opacity - 0.5).abs() < 1e-9);
    assert!((two.opacity - 0.5).abs() < 1e-9);
    assert_eq!(one.position, Position::new(80.0, 0.0));
    assert_eq!(two.position, Position::new(80.0, 0.0));
    assert_eq!(glyph(&scene, 'l').opacity, 1.0);
    assert_eq!(glyph(&scene, ';').position, Position::new(90.0, 0.0));
}

#[test]
fn kept_chars_move_along_progress() {
    let frame = transition_frame(
        AnimationSlide::new("a", "b", "rust", 1.0),
        AnimationSlide::new("b", "a\nb", "rust", 1.0),
        4,
        2,
    );
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(
        &frame,
        TransitionType::Diff,
        &mut cache,
        &Theme::dark(),
        metrics(),
    );
    let b = glyph(&scene, 'b');
    assert_eq!(b.opacity, 1.0);
    assert!((b.position.y - 10.0).abs() < 1e-9);
    assert_eq!(b.position.x, 0.0);
}

#[test]
fn kept_color_swaps_over_middle_half() {
    let theme = Theme::dark();
    let keyword = theme.color_for("keyword");
    let plain = theme.color_for("plain");
    let color_at = |index| {
        let frame = transition_frame(
            AnimationSlide::new("a", "x", "kw", 1.0),
            AnimationSlide::new("b", "x", "plaintext", 1.0),
            4,
            index,
        );
        let mut cache = ColorMapCache::new(KeywordOnly::default());
        let scene = compose_frame(&frame, TransitionType::Diff, &mut cache, &theme, metrics());
        glyph(&scene, 'x').color
    };

    assert_eq!(color_at(0), keyword);
    assert_eq!(color_at(1), keyword);
    assert_eq!(color_at(2), lerp_rgba8(keyword, plain, 0.5));
    assert_eq!(color_at(3), plain);
    assert_eq!(color_at(4), plain);
}

#[test]
fn fade_crossfades_both_layouts() {
    let frame = transition_frame(
        AnimationSlide::new("a", "ab", "rust", 1.0),
        AnimationSlide::new("b", "ab", "rust", 1.0),
        4,
        1,
    );
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(
        &frame,
        TransitionType::Fade,
        &mut cache,
        &Theme::dark(),
        metrics(),
    );
    assert_eq!(scene.glyphs.len(), 4);
    let fading_out: Vec<_> = scene.glyphs[..2].iter().map(|g| g.opacity).collect();
    let fading_in: Vec<_> = scene.glyphs[2..].iter().map(|g| g.opacity).collect();
    assert_eq!(fading_out, vec![0.75, 0.75]);
    assert_eq!(fading_in, vec![0.25, 0.25]);
}

#[test]
fn endpoints_drop_invisible_glyphs() {
    let first = transition_frame(
        AnimationSlide::new("a", "a", "rust", 1.0),
        AnimationSlide::new("b", "z", "rust", 1.0),
        4,
        0,
    );
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(
        &first,
        TransitionType::Diff,
        &mut cache,
        &Theme::dark(),
        metrics(),
    );
    assert_eq!(scene.glyphs.len(), 1);
    assert_eq!(scene.glyphs[0].ch, 'a');
}

#[test]
fn titles_crossfade_when_they_differ() {
    let frame = transition_frame(
        AnimationSlide::new("a", "x", "rust", 1.0).with_title("One"),
        AnimationSlide::new("b", "x", "rust", 1.0).with_title("Two"),
        4,
        1,
    );
    let mut cache = ColorMapCache::new(PlainHighlighter);
    let scene = compose_frame(
        &frame,
        TransitionType::Diff,
        &mut cache,
        &Theme::dark(),
        metrics(),
    );
    assert_eq!(scene.titles.len(), 2);
    assert_eq!(scene.titles[0].text, "One");
    assert!((scene.titles[0].opacity - 0.75).abs() < 1e-9);
    assert_eq!(scene.titles[1].text, "Two");
}

#[test]
fn cache_highlights_each_slide_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut cache = ColorMapCache::new(KeywordOnly(Arc::clone(&calls)));
    let a = AnimationSlide::new("a", "x", "kw", 1.0);
    let b = AnimationSlide::new("b", "y", "kw", 1.0);
    for _ in 0..3 {
        cache.get(&a);
        cache.get(&b);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
    cache.get(&a);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
