//! Layout engine – uses Taffy to compute flexbox layout from a styled
//! element tree, then converts the result into a tree of positioned boxes
//! in capture coordinates (points, origin at the captured element's top-left).

use std::collections::HashMap;

use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::ExportError;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self as css, ComputedStyle, StyledNode};

/// Gutter between a list marker and the item text, in points.
pub const MARKER_GUTTER: f32 = 4.0;

pub const LIST_MARKER: &str = "\u{2022}";

/// A positioned box in capture coordinates.
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    /// Bullet drawn in the left gutter of a list item.
    pub marker: Option<String>,
    pub children: Vec<PositionedBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxContent {
    None,
    /// Pre-wrapped lines of a text leaf.
    Text { lines: Vec<String> },
}

impl PositionedBox {
    /// Depth-first iterator over this box and every descendant.
    pub fn descendants(&self) -> Vec<&PositionedBox> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

fn taffy_err(e: taffy::TaffyError) -> ExportError {
    ExportError::Capture(format!("layout failed: {e}"))
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    node_markers: HashMap<NodeId, String>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        // Capture coordinates are scaled later; keep fractional points.
        let mut taffy = TaffyTree::new();
        taffy.disable_rounding();
        Self {
            taffy,
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            node_markers: HashMap::new(),
        }
    }

    /// Collect all text content from an inline subtree (spans, text nodes).
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::collect_inline_text).collect()
            }
        }
    }

    /// True when every child is text or a visible inline element.
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == css::Display::Inline && Self::all_inline(gc),
        })
    }

    fn build_node(&mut self, styled: &StyledNode, avail_width: f32) -> Result<NodeId, ExportError> {
        match styled {
            StyledNode::Text { text, style } => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                self.build_text_leaf(&collapsed, style, avail_width, false)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                ..
            } => self.build_element_node(tag, style, children, avail_width),
        }
    }

    /// A leaf holding wrapped text. Block leaves (paragraphs, headings, list
    /// items) span the available width so alignment and backgrounds behave
    /// like block boxes; inline leaves shrink to their longest line.
    fn build_text_leaf(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        avail_width: f32,
        block: bool,
    ) -> Result<NodeId, ExportError> {
        let bold = style.is_bold();
        let italic = style.is_italic();
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height = self.fonts.line_height_px(font_size, style.line_height);

        let chrome_w = style.padding.horizontal() + style.border.horizontal();
        let chrome_h = style.padding.top + style.padding.bottom + style.border.top + style.border.bottom;
        let outer_w = resolve_width(style.width, avail_width);
        let content_avail = (outer_w - chrome_w - style.margin.horizontal()).max(1.0);

        let shown = if style.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        let lines = wrap_text(shown.trim(), font_size, bold, italic, family, content_avail, self.fonts);
        let measured = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);

        let content_w = if block || style.width != css::Dimension::Auto {
            content_avail.max(measured)
        } else {
            measured
        };
        let content_h = lines.len() as f32 * line_height;

        let mut ts = self.computed_to_taffy(style);
        ts.size = Size {
            width: Dimension::Length(content_w + chrome_w),
            height: Dimension::Length(content_h + chrome_h),
        };
        ts.min_size = Size {
            width: Dimension::Length(0.0),
            height: Dimension::Auto,
        };

        let node = self.taffy.new_leaf(ts).map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        avail_width: f32,
    ) -> Result<NodeId, ExportError> {
        if style.display == css::Display::None {
            let node = self
                .taffy
                .new_leaf(Style {
                    display: taffy::Display::None,
                    ..Default::default()
                })
                .map_err(taffy_err)?;
            self.node_styles.insert(node, style.clone());
            return Ok(node);
        }

        // Text blocks whose children are all inline get their text merged into
        // a single wrapped leaf so spans flow with the surrounding text.
        if tag.is_text_block() && !children.is_empty() && Self::all_inline(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            let combined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if !combined.is_empty() {
                return self.build_text_leaf(&combined, style, avail_width, true);
            }
        }

        let own_width = resolve_width(style.width, avail_width) - style.margin.horizontal();
        let inner_width =
            (own_width - style.padding.horizontal() - style.border.horizontal()).max(0.0);

        let is_flex_row =
            style.display == css::Display::Flex && style.flex_direction == css::FlexDirection::Row;
        let child_widths = if is_flex_row {
            row_child_widths(style, children, inner_width)
        } else {
            vec![inner_width; children.len()]
        };

        let mut child_nodes = Vec::with_capacity(children.len());
        for (child, width) in children.iter().zip(child_widths) {
            let child_id = self.build_node(child, width)?;
            if *tag == Tag::Ul {
                if let StyledNode::Element { tag: Tag::Li, .. } = child {
                    self.node_markers.insert(child_id, LIST_MARKER.to_string());
                }
            }
            child_nodes.push(child_id);
        }

        let taffy_style = self.computed_to_taffy(style);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle) -> Style {
        let mut ts = Style::default();

        match s.display {
            css::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    css::FlexDirection::Row => taffy::FlexDirection::Row,
                    css::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    css::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    css::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    css::JustifyContent::Start => taffy::JustifyContent::Start,
                    css::JustifyContent::End => taffy::JustifyContent::End,
                    css::JustifyContent::Center => taffy::JustifyContent::Center,
                    css::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                });
                ts.align_items = Some(match s.align_items {
                    css::AlignItems::Start => taffy::AlignItems::Start,
                    css::AlignItems::End => taffy::AlignItems::End,
                    css::AlignItems::Center => taffy::AlignItems::Center,
                    css::AlignItems::Baseline => taffy::AlignItems::Baseline,
                    css::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            css::Display::Block => {
                // Vertical stacking.
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            css::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
                ts.align_items = Some(taffy::AlignItems::Baseline);
            }
            css::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        // Allow flex items to compress below their natural content size.
        if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            ts.min_size.width = Dimension::Length(0.0);
        }
        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;

        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin.top),
            right: LengthPercentageAuto::Length(s.margin.right),
            bottom: LengthPercentageAuto::Length(s.margin.bottom),
            left: LengthPercentageAuto::Length(s.margin.left),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding.top),
            right: LengthPercentage::Length(s.padding.right),
            bottom: LengthPercentage::Length(s.padding.bottom),
            left: LengthPercentage::Length(s.padding.left),
        };
        ts.border = Rect {
            top: LengthPercentage::Length(s.border.top),
            right: LengthPercentage::Length(s.border.right),
            bottom: LengthPercentage::Length(s.border.bottom),
            left: LengthPercentage::Length(s.border.left),
        };
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap_x),
            height: LengthPercentage::Length(s.gap_y),
        };

        ts
    }

    /// Extract positioned boxes after layout computation. Hidden nodes are
    /// dropped.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, ExportError> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let mut children = Vec::new();
        for child in self.taffy.children(node).map_err(taffy_err)? {
            let hidden = self
                .node_styles
                .get(&child)
                .is_some_and(|s| s.display == css::Display::None);
            if !hidden {
                children.push(self.extract(child, x, y)?);
            }
        }

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            marker: self.node_markers.get(&node).cloned(),
            children,
        })
    }
}

fn resolve_width(d: css::Dimension, avail: f32) -> f32 {
    match d {
        css::Dimension::Pt(w) => w,
        css::Dimension::Percent(p) => avail * p / 100.0,
        css::Dimension::Auto => avail,
    }
}

fn dim_to_taffy(d: css::Dimension) -> Dimension {
    match d {
        css::Dimension::Auto => Dimension::Auto,
        css::Dimension::Pt(v) => Dimension::Length(v),
        css::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

/// Wrapping width for each child of a flex row: children with an explicit
/// width get it, the rest share what remains after gaps.
fn row_child_widths(style: &ComputedStyle, children: &[StyledNode], inner_width: f32) -> Vec<f32> {
    let visible = |c: &StyledNode| match c {
        StyledNode::Element { style, .. } => style.display != css::Display::None,
        StyledNode::Text { .. } => true,
    };
    let count = children.iter().filter(|c| visible(c)).count();
    let gap_total = style.gap_x * count.saturating_sub(1) as f32;

    let explicit: Vec<Option<f32>> = children
        .iter()
        .map(|c| match c {
            StyledNode::Element { style, .. } if style.display != css::Display::None => {
                match style.width {
                    css::Dimension::Auto => None,
                    d => Some(resolve_width(d, inner_width)),
                }
            }
            _ => None,
        })
        .collect();
    let fixed: f32 = explicit.iter().flatten().sum();
    let flexible = children
        .iter()
        .zip(&explicit)
        .filter(|(c, e)| visible(c) && e.is_none())
        .count()
        .max(1);
    let share = ((inner_width - gap_total - fixed) / flexible as f32).max(1.0);

    children
        .iter()
        .zip(explicit)
        .map(|(c, e)| match e {
            // The child resolves its own percentage against what it is given.
            Some(_) => inner_width,
            None if visible(c) => share,
            None => 0.0,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out a styled element at `viewport_width` points. The returned root box
/// spans the viewport; its height is the captured element's full height.
pub fn compute_layout(
    root: &StyledNode,
    viewport_width: f32,
    fonts: &FontManager,
) -> Result<PositionedBox, ExportError> {
    let mut builder = LayoutBuilder::new(fonts);
    let child = builder.build_node(root, viewport_width)?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(viewport_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };
    let root_id = builder
        .taffy
        .new_with_children(root_style, &[child])
        .map_err(taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root_id,
            Size {
                width: AvailableSpace::Definite(viewport_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    let mut viewport = builder.extract(root_id, 0.0, 0.0)?;
    viewport.style.background_color = css::Color::WHITE;
    Ok(viewport)
}
