use crate::foundation::core::{Canvas, GlyphMetrics};
use crate::foundation::error::{MorphError, MorphResult};
use crate::highlight::lexer::LexicalHighlighter;
use crate::model::slide::EditorSettings;
use crate::playback::orchestrator::AnimationFrame;
use crate::render::backend::{FrameRGBA, RenderRequest, RenderSurface};
use crate::render::scene::{ColorMapCache, GlyphInstance, Scene, TitleInstance, compose_frame};
use crate::render::theme::Theme;
use std::collections::HashMap;
use std::path::PathBuf;

/// Monospace fonts tried when `editor.font_path` is unset.
const SYSTEM_MONOSPACE_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Title size relative to the code font size.
const TITLE_SCALE: f32 = 1.25;

/// First readable entry of [`SYSTEM_MONOSPACE_FONTS`].
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_MONOSPACE_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Ink;

struct LoadedFont {
    path: PathBuf,
    family: String,
    data: vello_cpu::peniko::FontData,
}

#[derive(Clone, Copy, Debug)]
struct GlyphShape {
    id: u32,
    x: f32,
    baseline: f32,
}

/// Reference [`RenderSurface`] rasterizing on the CPU with `vello_cpu`, shaping with `parley`.
///
/// Each character is shaped once per font size and cached; frames are drawn from the
/// [`Scene`] produced by [`compose_frame`].
pub struct CpuRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Ink>,
    font: Option<LoadedFont>,
    font_size: f32,
    glyphs: HashMap<char, Option<GlyphShape>>,
    colors: ColorMapCache,
    theme: (String, Theme),
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: Option<vello_cpu::Pixmap>,
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuRenderer {
    /// Renderer using the built-in [`LexicalHighlighter`].
    pub fn new() -> Self {
        Self::with_colors(ColorMapCache::new(LexicalHighlighter))
    }

    /// Renderer using a caller-provided color map cache (and thus highlighter).
    pub fn with_colors(colors: ColorMapCache) -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font: None,
            font_size: 0.0,
            glyphs: HashMap::new(),
            colors,
            theme: ("dark".to_string(), Theme::dark()),
            ctx: None,
            pixmap: None,
        }
    }

    fn ensure_font(&mut self, editor: &EditorSettings) -> MorphResult<()> {
        let path = match &editor.font_path {
            Some(p) => p.clone(),
            None => find_system_font().ok_or_else(|| {
                MorphError::validation(
                    "editor.font_path is unset and no system monospace font was found",
                )
            })?,
        };
        if self.font.as_ref().is_some_and(|f| f.path == path) {
            return Ok(());
        }

        let bytes = std::fs::read(&path).map_err(|e| {
            MorphError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            MorphError::validation(format!(
                "no font families registered from '{}'",
                path.display()
            ))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| MorphError::validation("registered font family has no name"))?
            .to_string();
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);

        tracing::debug!(font = %path.display(), family = %family, "font loaded");
        self.font = Some(LoadedFont { path, family, data });
        self.glyphs.clear();
        Ok(())
    }

    fn layout(&mut self, text: &str, size_px: f32) -> MorphResult<parley::Layout<Ink>> {
        let family = self
            .font
            .as_ref()
            .map(|f| f.family.clone())
            .ok_or_else(|| MorphError::capture("font not loaded"))?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(Ink));
        let mut layout: parley::Layout<Ink> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    fn glyph_shape(&mut self, ch: char) -> MorphResult<Option<GlyphShape>> {
        if let Some(shape) = self.glyphs.get(&ch) {
            return Ok(*shape);
        }
        let layout = self.layout(ch.encode_utf8(&mut [0u8; 4]), self.font_size)?;
        let mut shape = None;
        'lines: for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                if let Some(g) = run.positioned_glyphs().next() {
                    shape = Some(GlyphShape {
                        id: g.id,
                        x: g.x,
                        baseline: g.y,
                    });
                    break 'lines;
                }
            }
        }
        if shape.is_none() {
            tracing::debug!(ch = %ch.escape_debug(), "no glyph for character");
        }
        self.glyphs.insert(ch, shape);
        Ok(shape)
    }

    fn set_font_size(&mut self, size: f32) {
        if self.font_size != size {
            self.font_size = size;
            self.glyphs.clear();
        }
    }

    fn theme_for(&mut self, name: &str) -> Theme {
        if self.theme.0 != name {
            self.theme = (name.to_string(), Theme::named(name));
        }
        self.theme.1.clone()
    }

    fn draw_titles(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        titles: &[TitleInstance],
        theme: &Theme,
        padding: f64,
    ) -> MorphResult<()> {
        let size = self.font_size * TITLE_SCALE;
        let [r, g, b, a] = theme.title;
        for title in titles {
            let layout = self.layout(&title.text, size)?;
            let Some(font) = self.font.as_ref() else {
                return Err(MorphError::capture("font not loaded"));
            };
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((padding, padding)));
            let opacity = title.opacity as f32;
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity);
            }
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font.data)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            if opacity < 1.0 {
                ctx.pop_layer();
            }
        }
        Ok(())
    }

    fn draw_glyphs(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        glyphs: &[GlyphInstance],
        origin: (f64, f64),
        metrics: GlyphMetrics,
    ) -> MorphResult<()> {
        // Vertically center the em box inside the cell.
        let lead = ((metrics.line_height - f64::from(self.font_size) * 1.2) / 2.0).max(0.0);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.0, origin.1 + lead)));
        for g in glyphs {
            let Some(shape) = self.glyph_shape(g.ch)? else {
                continue;
            };
            let Some(font) = self.font.as_ref() else {
                return Err(MorphError::capture("font not loaded"));
            };
            let [r, gr, b, a] = g.color;
            let alpha = (f64::from(a) * g.opacity.clamp(0.0, 1.0)).round() as u8;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, gr, b, alpha));
            ctx.glyph_run(&font.data)
                .font_size(self.font_size)
                .fill_glyphs(std::iter::once(vello_cpu::Glyph {
                    id: shape.id,
                    x: g.position.x as f32 + shape.x,
                    y: g.position.y as f32 + shape.baseline,
                }));
        }
        Ok(())
    }
}

fn canvas_dims(canvas: Canvas) -> MorphResult<(u16, u16)> {
    let w = u16::try_from(canvas.width)
        .map_err(|_| MorphError::validation("canvas width exceeds renderer limits"))?;
    let h = u16::try_from(canvas.height)
        .map_err(|_| MorphError::validation("canvas height exceeds renderer limits"))?;
    if w == 0 || h == 0 {
        return Err(MorphError::validation("canvas must be non-empty"));
    }
    Ok((w, h))
}

impl RenderSurface for CpuRenderer {
    fn reset(&mut self) {
        self.colors.clear();
        self.pixmap = None;
    }

    fn render(&mut self, frame: &AnimationFrame, req: &RenderRequest<'_>) -> MorphResult<()> {
        let canvas = req.settings.resolution.canvas();
        let (width, height) = canvas_dims(canvas)?;
        self.ensure_font(req.editor)?;
        self.set_font_size(req.editor.font_size as f32);

        let theme = self.theme_for(&req.editor.background);
        let metrics = GlyphMetrics::for_font_size(req.editor.font_size);
        let scene: Scene = compose_frame(
            frame,
            req.settings.transition_type,
            &mut self.colors,
            &theme,
            metrics,
        );

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        if req.editor.show_background {
            let [r, g, b, a] = theme.background;
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            ));
        }

        let padding = req.editor.padding;
        let title_block = if scene.titles.is_empty() {
            0.0
        } else {
            f64::from(self.font_size * TITLE_SCALE) * 2.0
        };
        let drawn = self
            .draw_titles(&mut ctx, &scene.titles, &theme, padding)
            .and_then(|()| {
                self.draw_glyphs(&mut ctx, &scene.glyphs, (padding, padding + title_block), metrics)
            });
        if let Err(err) = drawn {
            self.ctx = Some(ctx);
            return Err(err);
        }

        let mut pixmap = match self.pixmap.take() {
            Some(p) if p.width() == width && p.height() == height => p,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        pixmap.data_as_u8_slice_mut().fill(0);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.pixmap = Some(pixmap);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn capture(&mut self, canvas: Canvas) -> MorphResult<FrameRGBA> {
        let pixmap = self
            .pixmap
            .as_ref()
            .ok_or_else(|| MorphError::capture("nothing has been rendered yet"))?;
        if u32::from(pixmap.width()) != canvas.width || u32::from(pixmap.height()) != canvas.height
        {
            return Err(MorphError::capture(format!(
                "surface is {}x{}, capture requested {}x{}",
                pixmap.width(),
                pixmap.height(),
                canvas.width,
                canvas.height
            )));
        }
        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
