use crate::diff::token::EntityKind;
use crate::foundation::core::{Cell, GlyphMetrics, Position};
use crate::foundation::math::{lerp_rgba8, smoothstep};
use crate::highlight::Highlighter;
use crate::highlight::color_map::{ColorMap, color_map};
use crate::model::slide::{AnimationSlide, TransitionType};
use crate::playback::orchestrator::AnimationFrame;
use crate::render::theme::Theme;
use std::collections::HashMap;
use std::sync::Arc;

/// Window of transition progress over which kept characters swap color classes.
const COLOR_SWAP_START: f64 = 0.25;
const COLOR_SWAP_END: f64 = 0.75;

/// One character to draw, in layout space (top-left of its cell).
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphInstance {
    /// The character.
    pub ch: char,
    /// Top-left of the glyph cell.
    pub position: Position,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Straight RGBA8 fill.
    pub color: [u8; 4],
}

/// Slide title text to draw above the code.
#[derive(Clone, Debug, PartialEq)]
pub struct TitleInstance {
    /// Title text.
    pub text: String,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Everything a renderer draws for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Code glyphs in draw order.
    pub glyphs: Vec<GlyphInstance>,
    /// Titles, at most two during a fading title change.
    pub titles: Vec<TitleInstance>,
}

/// Per-export color maps, keyed by language and code.
pub struct ColorMapCache {
    highlighter: Box<dyn Highlighter + Send>,
    maps: HashMap<u64, Arc<ColorMap>>,
}

impl std::fmt::Debug for ColorMapCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorMapCache")
            .field("maps", &self.maps.len())
            .finish_non_exhaustive()
    }
}

impl ColorMapCache {
    /// Empty cache backed by `highlighter`.
    pub fn new(highlighter: impl Highlighter + Send + 'static) -> Self {
        Self {
            highlighter: Box::new(highlighter),
            maps: HashMap::new(),
        }
    }

    /// Color map of `slide`, highlighting on first use.
    pub fn get(&mut self, slide: &AnimationSlide) -> Arc<ColorMap> {
        let key = slide_key(slide);
        if let Some(map) = self.maps.get(&key) {
            return Arc::clone(map);
        }
        let map = Arc::new(color_map(
            &slide.code,
            &slide.language,
            self.highlighter.as_ref(),
        ));
        self.maps.insert(key, Arc::clone(&map));
        map
    }

    /// Number of cached maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Drop every cached map.
    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

fn slide_key(slide: &AnimationSlide) -> u64 {
    let mut h = xxhash_rust::xxh3::Xxh3::with_seed(0xC0DE_0051_1DE5_u64);
    h.update(slide.language.as_bytes());
    h.update(&[0]);
    h.update(slide.code.as_bytes());
    h.digest()
}

/// Cells of every visible character of `code`, in document order.
///
/// Uses the same cursor rules as the differ: `\n` advances the line, `\r` is dropped.
pub fn code_cells(code: &str) -> impl Iterator<Item = (char, Cell)> + '_ {
    let mut line = 0u32;
    let mut column = 0u32;
    code.chars().filter_map(move |ch| match ch {
        '\n' => {
            line += 1;
            column = 0;
            None
        }
        '\r' => None,
        _ => {
            let cell = Cell::new(line, column);
            column += 1;
            (!ch.is_whitespace()).then_some((ch, cell))
        }
    })
}

fn slide_glyphs(
    slide: &AnimationSlide,
    map: &ColorMap,
    theme: &Theme,
    metrics: GlyphMetrics,
    opacity: f64,
    out: &mut Vec<GlyphInstance>,
) {
    out.extend(code_cells(&slide.code).map(|(ch, cell)| GlyphInstance {
        ch,
        position: cell.position(metrics),
        opacity,
        color: theme.color_for(map.class_at(cell)),
    }));
}

fn titles(from: &str, to: &str, progress: f64) -> Vec<TitleInstance> {
    if from == to {
        return if from.is_empty() {
            Vec::new()
        } else {
            vec![TitleInstance {
                text: from.to_string(),
                opacity: 1.0,
            }]
        };
    }
    [(from, 1.0 - progress), (to, progress)]
        .into_iter()
        .filter(|(t, o)| !t.is_empty() && *o > 0.0)
        .map(|(t, o)| TitleInstance {
            text: t.to_string(),
            opacity: o,
        })
        .collect()
}

/// Place every character of `frame`.
///
/// Hold frames draw the slide at full opacity. Diff transitions move kept characters from their
/// source cell to their destination cell along the eased progress, blending their color class
/// over the middle half of the transition; removed characters stay put and fade out, added
/// characters sit at their destination and fade in. Fade transitions crossfade the two layouts.
pub fn compose_frame(
    frame: &AnimationFrame,
    transition_type: TransitionType,
    cache: &mut ColorMapCache,
    theme: &Theme,
    metrics: GlyphMetrics,
) -> Scene {
    let mut glyphs = Vec::new();
    match frame {
        AnimationFrame::Slide { slide, .. } => {
            let map = cache.get(slide);
            slide_glyphs(slide, &map, theme, metrics, 1.0, &mut glyphs);
            Scene {
                glyphs,
                titles: titles(&slide.title, &slide.title, 1.0),
            }
        }
        AnimationFrame::Transition { frame, .. } => {
            let from_map = cache.get(&frame.from_slide);
            let to_map = cache.get(&frame.to_slide);
            let progress = frame.progress.clamp(0.0, 1.0);

            match transition_type {
                TransitionType::Fade => {
                    slide_glyphs(
                        &frame.from_slide,
                        &from_map,
                        theme,
                        metrics,
                        frame.removed_opacity,
                        &mut glyphs,
                    );
                    slide_glyphs(
                        &frame.to_slide,
                        &to_map,
                        theme,
                        metrics,
                        frame.added_opacity,
                        &mut glyphs,
                    );
                }
                TransitionType::Diff => {
                    let swap = smoothstep(COLOR_SWAP_START, COLOR_SWAP_END, progress);
                    for e in &frame.diff.entities {
                        if e.content.is_whitespace() {
                            continue;
                        }
                        let from_color = e
                            .from_cell
                            .map(|c| theme.color_for(from_map.class_at(c)));
                        let to_color = e.to_cell.map(|c| theme.color_for(to_map.class_at(c)));
                        let glyph = match (e.kind, e.from, e.to, from_color, to_color) {
                            (EntityKind::Kept, Some(a), Some(b), Some(ca), Some(cb)) => {
                                GlyphInstance {
                                    ch: e.content,
                                    position: a.lerp(b, progress),
                                    opacity: 1.0,
                                    color: lerp_rgba8(ca, cb, swap),
                                }
                            }
                            (EntityKind::Removed, Some(a), _, Some(ca), _) => GlyphInstance {
                                ch: e.content,
                                position: a,
                                opacity: frame.removed_opacity,
                                color: ca,
                            },
                            (EntityKind::Added, _, Some(b), _, Some(cb)) => GlyphInstance {
                                ch: e.content,
                                position: b,
                                opacity: frame.added_opacity,
                                color: cb,
                            },
                            _ => continue,
                        };
                        glyphs.push(glyph);
                    }
                }
            }
            glyphs.retain(|g| g.opacity > 0.0);
            Scene {
                glyphs,
                titles: titles(&frame.from_slide.title, &frame.to_slide.title, progress),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
