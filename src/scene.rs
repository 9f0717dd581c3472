//! Scene – the frozen display list between layout and painting. Every box
//! is flattened into filled rectangles and positioned text runs, in points
//! with the origin at the captured element's top-left corner.

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox, MARKER_GUTTER};
use crate::style::{Color, ComputedStyle, TextAlign};

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    /// Paint order: earlier items are painted first.
    pub items: Vec<SceneItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [u8; 3],
    },
    Text(TextRun),
}

/// One line of text in a single face and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline position, measured down from the top.
    pub baseline: f32,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [u8; 3],
}

impl Scene {
    /// Flatten a laid-out box tree.
    pub fn from_layout(root: &PositionedBox, fonts: &FontManager) -> Self {
        let mut items = Vec::new();
        flatten(root, fonts, &mut items);
        Self {
            width: root.width,
            height: root.height,
            items,
        }
    }

    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.items.iter().filter_map(|item| match item {
            SceneItem::Text(run) => Some(run),
            SceneItem::Rect { .. } => None,
        })
    }
}

fn flatten(pbox: &PositionedBox, fonts: &FontManager, items: &mut Vec<SceneItem>) {
    let s = &pbox.style;

    if !s.background_color.is_transparent() && pbox.width > 0.0 && pbox.height > 0.0 {
        items.push(SceneItem::Rect {
            x: pbox.x,
            y: pbox.y,
            width: pbox.width,
            height: pbox.height,
            color: s.background_color.to_rgb8(),
        });
    }
    push_borders(pbox, items);

    let content_x = pbox.x + s.padding.left + s.border.left;
    let content_y = pbox.y + s.padding.top + s.border.top;
    let content_w = pbox.width - s.padding.horizontal() - s.border.horizontal();
    let line_height = fonts.line_height_px(s.font_size, s.line_height);
    let first_baseline = content_y + baseline_offset(s, line_height, fonts);

    if let BoxContent::Text { lines } = &pbox.content {
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_w = fonts.measure_text_width(line, s.font_size, s.is_bold(), s.is_italic(), &s.font_family);
            let dx = match s.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((content_w - line_w) / 2.0).max(0.0),
                TextAlign::Right => (content_w - line_w).max(0.0),
            };
            items.push(SceneItem::Text(text_run(
                s,
                content_x + dx,
                first_baseline + i as f32 * line_height,
                line,
            )));
        }
    }

    if let Some(marker) = &pbox.marker {
        let marker_w = fonts.measure_text_width(marker, s.font_size, false, false, &s.font_family);
        let mut run = text_run(s, pbox.x - marker_w - MARKER_GUTTER, first_baseline, marker);
        run.bold = false;
        run.italic = false;
        items.push(SceneItem::Text(run));
    }

    for child in &pbox.children {
        flatten(child, fonts, items);
    }
}

/// Distance from the top of a line box to its baseline: half the leading
/// plus the ascender.
fn baseline_offset(s: &ComputedStyle, line_height: f32, fonts: &FontManager) -> f32 {
    let ascender = fonts.ascender_px(s.font_size, s.is_bold(), s.is_italic(), &s.font_family);
    let descender = fonts.descender_px(s.font_size, s.is_bold(), s.is_italic(), &s.font_family);
    (line_height - (ascender - descender)) / 2.0 + ascender
}

fn text_run(s: &ComputedStyle, x: f32, baseline: f32, text: &str) -> TextRun {
    TextRun {
        x,
        baseline,
        text: text.to_string(),
        font_family: s.font_family.clone(),
        font_size: s.font_size,
        bold: s.is_bold(),
        italic: s.is_italic(),
        color: s.color.to_rgb8(),
    }
}

fn push_borders(pbox: &PositionedBox, items: &mut Vec<SceneItem>) {
    let b = &pbox.style.border;
    let color: Color = pbox.style.border_color;
    let mut edge = |x: f32, y: f32, width: f32, height: f32| {
        if width > 0.0 && height > 0.0 {
            items.push(SceneItem::Rect {
                x,
                y,
                width,
                height,
                color: color.to_rgb8(),
            });
        }
    };
    edge(pbox.x, pbox.y, pbox.width, b.top);
    edge(pbox.x, pbox.y + pbox.height - b.bottom, pbox.width, b.bottom);
    edge(pbox.x, pbox.y, b.left, pbox.height);
    edge(pbox.x + pbox.width - b.right, pbox.y, b.right, pbox.height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::layout::compute_layout;
    use crate::style::build_styled_element;

    fn scene(html: &str, width: f32) -> Scene {
        let tree = DomTree::parse(html);
        let styled = build_styled_element(tree.element_at(&[0]).unwrap(), None);
        let fonts = FontManager::default();
        let root = compute_layout(&styled, width, &fonts).unwrap();
        Scene::from_layout(&root, &fonts)
    }

    #[test]
    fn viewport_background_comes_first() {
        let s = scene("<div><p>Hi</p></div>", 200.0);
        match &s.items[0] {
            SceneItem::Rect { color, width, .. } => {
                assert_eq!(*color, [255, 255, 255]);
                assert_eq!(*width, 200.0);
            }
            other => panic!("expected background rect, got {other:?}"),
        }
    }

    #[test]
    fn centered_text_is_offset() {
        let s = scene(r#"<div class="text-center"><p>Hi</p></div>"#, 200.0);
        let run = s.text_runs().next().unwrap();
        // "Hi" at 11pt synthetic = 11pt wide.
        assert!((run.x - (200.0 - 11.0) / 2.0).abs() < 0.5, "x = {}", run.x);
        assert!(run.baseline > 0.0);
    }

    #[test]
    fn border_bottom_becomes_a_strip() {
        let s = scene(r#"<div><h2 class="border-b border-gray-300">Skills</h2></div>"#, 200.0);
        let strips: Vec<_> = s
            .items
            .iter()
            .filter(|i| matches!(i, SceneItem::Rect { height, .. } if (*height - 1.0).abs() < 1e-3))
            .collect();
        assert_eq!(strips.len(), 1);
    }

    #[test]
    fn markers_sit_left_of_items() {
        let s = scene("<div><ul><li>Rust</li></ul></div>", 200.0);
        let runs: Vec<_> = s.text_runs().collect();
        assert_eq!(runs.len(), 2);
        let (text, marker) = (runs[0], runs[1]);
        assert_eq!(marker.text, "\u{2022}");
        assert!(marker.x < text.x);
        assert_eq!(marker.baseline, text.baseline);
    }
}
