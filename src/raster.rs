//! Painter – turns a [`Scene`] into an RGB bitmap.
//!
//! Painting goes through a `tiny_skia` pixmap: rectangles are filled with
//! anti-aliased edges and text is filled from real glyph outlines when the
//! font manager holds a face for the run. Runs without one are returned as
//! an overlay for the PDF text layer.

use image::RgbImage;
use log::debug;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::scene::{Scene, SceneItem, TextRun};

/// Upper bound on painted pixels (about 800 MB of RGBA data).
pub const MAX_PIXELS: u64 = 200_000_000;

/// Result of painting a scene.
pub struct Painted {
    pub image: RgbImage,
    /// Runs that could not be painted for lack of a font face.
    pub overlay: Vec<TextRun>,
}

/// Paint `scene` at `pixel_scale` pixels per point on a white background.
pub fn paint(scene: &Scene, pixel_scale: f32, fonts: &FontManager) -> Result<Painted, ExportError> {
    if !(pixel_scale.is_finite() && pixel_scale > 0.0) {
        return Err(ExportError::Capture(format!("invalid pixel scale {pixel_scale}")));
    }
    let width = (scene.width * pixel_scale).ceil().max(1.0) as u32;
    let height = (scene.height * pixel_scale).ceil().max(1.0) as u32;
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(ExportError::Capture(format!(
            "bitmap of {width}x{height} pixels exceeds the capture limit"
        )));
    }
    debug!("painting {} items into {width}x{height} px", scene.items.len());

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Capture(format!("cannot allocate a {width}x{height} pixmap")))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut overlay = Vec::new();

    for item in &scene.items {
        match item {
            SceneItem::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let rect = Rect::from_xywh(
                    x * pixel_scale,
                    y * pixel_scale,
                    (width * pixel_scale).max(1.0),
                    (height * pixel_scale).max(1.0),
                );
                // Degenerate or non-finite boxes have nothing to paint.
                if let Some(rect) = rect {
                    pixmap.fill_rect(rect, &solid(*color), Transform::identity(), None);
                }
            }
            SceneItem::Text(run) => {
                if !paint_text(&mut pixmap, run, pixel_scale, fonts) {
                    overlay.push(run.clone());
                }
            }
        }
    }

    Ok(Painted {
        image: to_rgb(&pixmap)?,
        overlay,
    })
}

fn solid(color: [u8; 3]) -> Paint<'static> {
    let [r, g, b] = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    paint
}

/// Fill one text run from glyph outlines. Returns false when no face is
/// available for it.
fn paint_text(pixmap: &mut Pixmap, run: &TextRun, pixel_scale: f32, fonts: &FontManager) -> bool {
    let Some(face) = fonts.face(&run.font_family, run.bold, run.italic) else {
        return false;
    };
    let units = run.font_size / face.units_per_em() as f32;
    let mut pen_x = run.x;
    let mut builder = PathBuilder::new();

    for ch in run.text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            pen_x += run.font_size * 0.5;
            continue;
        };
        let mut pen = GlyphPen {
            builder: &mut builder,
            origin_x: pen_x * pixel_scale,
            baseline: run.baseline * pixel_scale,
            scale: units * pixel_scale,
        };
        face.outline_glyph(gid, &mut pen);
        pen_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * units;
    }

    // Whitespace-only runs leave the builder empty.
    if let Some(path) = builder.finish() {
        pixmap.fill_path(&path, &solid(run.color), FillRule::Winding, Transform::identity(), None);
    }
    true
}

/// Maps font units into bitmap pixels (y flipped) while building a path.
struct GlyphPen<'a> {
    builder: &'a mut PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPen<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.map(x, y);
        self.builder.move_to(px, py);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.map(x, y);
        self.builder.line_to(px, py);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (cx, cy) = self.map(x1, y1);
        let (px, py) = self.map(x, y);
        self.builder.quad_to(cx, cy, px, py);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1x, c1y) = self.map(x1, y1);
        let (c2x, c2y) = self.map(x2, y2);
        let (px, py) = self.map(x, y);
        self.builder.cubic_to(c1x, c1y, c2x, c2y, px, py);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Drop the alpha channel. Every pixel sits on the opaque white background,
/// so premultiplied and straight RGB agree.
fn to_rgb(pixmap: &Pixmap) -> Result<RgbImage, ExportError> {
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(pixmap.width(), pixmap.height(), rgb)
        .ok_or_else(|| ExportError::Capture("pixmap size does not match its data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_scene(width: f32, height: f32, rect: (f32, f32, f32, f32), color: [u8; 3]) -> Scene {
        Scene {
            width,
            height,
            items: vec![SceneItem::Rect {
                x: rect.0,
                y: rect.1,
                width: rect.2,
                height: rect.3,
                color,
            }],
        }
    }

    #[test]
    fn fills_pixel_aligned_square() {
        let scene = rect_scene(4.0, 4.0, (1.0, 1.0, 2.0, 2.0), [0, 0, 0]);
        let img = paint(&scene, 1.0, &FontManager::default()).unwrap().image;
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(3, 3).0, [255, 255, 255]);
    }

    #[test]
    fn half_covered_pixels_blend() {
        let scene = rect_scene(2.0, 1.0, (0.5, 0.0, 1.0, 1.0), [0, 0, 0]);
        let img = paint(&scene, 1.0, &FontManager::default()).unwrap().image;
        let v = img.get_pixel(0, 0).0[0];
        assert!((120..=135).contains(&v), "got {v}");
    }

    #[test]
    fn outlines_fill_in_either_winding() {
        for clockwise in [true, false] {
            let mut pixmap = Pixmap::new(10, 10).unwrap();
            pixmap.fill(tiny_skia::Color::WHITE);
            let mut builder = PathBuilder::new();
            let mut pen = GlyphPen {
                builder: &mut builder,
                origin_x: 0.0,
                baseline: 10.0,
                scale: 1.0,
            };
            // Font units point up; the pen flips them onto the bitmap.
            ttf_parser::OutlineBuilder::move_to(&mut pen, 0.0, 10.0);
            if clockwise {
                ttf_parser::OutlineBuilder::line_to(&mut pen, 10.0, 10.0);
                ttf_parser::OutlineBuilder::line_to(&mut pen, 0.0, 0.0);
            } else {
                ttf_parser::OutlineBuilder::line_to(&mut pen, 0.0, 0.0);
                ttf_parser::OutlineBuilder::line_to(&mut pen, 10.0, 10.0);
            }
            ttf_parser::OutlineBuilder::close(&mut pen);
            let path = builder.finish().unwrap();
            pixmap.fill_path(&path, &solid([0, 0, 0]), FillRule::Winding, Transform::identity(), None);

            let img = to_rgb(&pixmap).unwrap();
            assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
            assert_eq!(img.get_pixel(9, 9).0, [255, 255, 255]);
        }
    }

    #[test]
    fn paints_rects_and_defers_text_without_faces() {
        let scene = Scene {
            width: 10.0,
            height: 5.0,
            items: vec![
                SceneItem::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 5.0,
                    height: 5.0,
                    color: [255, 0, 0],
                },
                SceneItem::Text(TextRun {
                    x: 1.0,
                    baseline: 4.0,
                    text: "Hi".into(),
                    font_family: "Helvetica".into(),
                    font_size: 4.0,
                    bold: false,
                    italic: false,
                    color: [0, 0, 0],
                }),
            ],
        };
        let painted = paint(&scene, 2.0, &FontManager::default()).unwrap();
        assert_eq!(painted.image.dimensions(), (20, 10));
        assert_eq!(painted.image.get_pixel(3, 3).0, [255, 0, 0]);
        assert_eq!(painted.image.get_pixel(15, 3).0, [255, 255, 255]);
        assert_eq!(painted.overlay.len(), 1);
    }

    #[test]
    fn zero_sized_boxes_still_show() {
        let scene = rect_scene(4.0, 4.0, (1.0, 1.0, 4.0, 0.0), [0, 0, 255]);
        let img = paint(&scene, 1.0, &FontManager::default()).unwrap().image;
        assert_eq!(img.get_pixel(2, 1).0, [0, 0, 255]);
    }

    #[test]
    fn rejects_oversized_bitmaps() {
        let scene = Scene {
            width: 100_000.0,
            height: 100_000.0,
            items: Vec::new(),
        };
        assert!(matches!(
            paint(&scene, 1.0, &FontManager::default()),
            Err(ExportError::Capture(_))
        ));
    }
}
