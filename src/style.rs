//! Style resolver – maps inline `style` declarations and the Tailwind-like
//! utility classes used by the resume templates onto a flat
//! [`ComputedStyle`] consumed by the layout engine.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap_x: f32,
    pub gap_y: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,

    // Spacing (pt)
    pub margin: Edges,
    pub padding: Edges,

    // Border
    pub border: Edges,
    pub border_color: Color,

    // Typography (inherited)
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub font_style: FontStyle,
    pub uppercase: bool,

    // Background
    pub background_color: Color,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap_x: 0.0,
            gap_y: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            margin: Edges::ZERO,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            border_color: Color::BLACK,
            font_size: 11.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            font_style: FontStyle::Normal,
            uppercase: false,
            background_color: Color::TRANSPARENT,
        }
    }
}

impl ComputedStyle {
    /// Copy of the inherited text properties only; box properties reset.
    pub fn inherit_text(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_family: parent.font_family.clone(),
            color: parent.color,
            text_align: parent.text_align,
            line_height: parent.line_height,
            font_style: parent.font_style,
            uppercase: parent.uppercase,
            ..Self::default()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Baseline,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Pt(f32),
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

/// Named colours usable as `text-*`, `bg-*` and `border-*` suffixes.
fn palette(name: &str) -> Option<Color> {
    let hex = match name {
        "white" => "#ffffff",
        "black" => "#000000",
        "primary" => "#1d4ed8",
        "gray-100" => "#f3f4f6",
        "gray-200" => "#e5e7eb",
        "gray-300" => "#d1d5db",
        "gray-500" => "#6b7280",
        "gray-600" => "#4b5563",
        "gray-700" => "#374151",
        "gray-800" => "#1f2937",
        "gray-900" => "#111827",
        _ => return None,
    };
    Color::from_hex(hex)
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = match parent {
        Some(p) => ComputedStyle::inherit_text(p),
        None => ComputedStyle::default(),
    };
    apply_tag_defaults(&mut style, &element.tag);

    for class in element.classes() {
        apply_utility_class(&mut style, class);
    }
    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }
    style
}

/// Tag semantics. Heading sizes are relative to the inherited base size so
/// that the user's chosen font size scales the whole document.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    match tag {
        Tag::H1 => {
            s.font_size *= 2.0;
            s.font_weight = FontWeight::Bold;
            s.line_height = 1.2;
        }
        Tag::H2 => {
            s.font_size *= 1.35;
            s.font_weight = FontWeight::Bold;
            s.line_height = 1.25;
        }
        Tag::H3 => {
            s.font_weight = FontWeight::Bold;
        }
        Tag::Ul => {
            s.padding.left = 14.0;
        }
        Tag::Li => {
            s.margin.bottom = 2.0;
        }
        Tag::Span => s.display = Display::Inline,
        Tag::Unknown(_) => s.display = Display::None,
        Tag::Header | Tag::Main | Tag::Section | Tag::Div | Tag::P => {}
    }
}

/// Apply a single utility class. Unknown classes (including purely visual
/// ones such as `rounded-full`) are ignored.
fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "flex" => s.display = Display::Flex,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "hidden" => s.display = Display::None,

        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-1" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
        }
        "shrink-0" => s.flex_shrink = 0.0,

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,

        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-baseline" => s.align_items = AlignItems::Baseline,

        "font-bold" | "font-semibold" => s.font_weight = FontWeight::Bold,
        "font-normal" | "font-medium" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "uppercase" => s.uppercase = true,

        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,

        // Relative to the inherited base size.
        "text-xs" => s.font_size *= 0.8,
        "text-sm" => s.font_size *= 0.9,
        "text-lg" => s.font_size *= 1.15,
        "text-xl" => s.font_size *= 1.3,
        "text-2xl" => s.font_size *= 1.6,
        "text-3xl" => s.font_size *= 2.0,

        "w-full" => s.width = Dimension::Percent(100.0),
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(100.0 / 3.0),
        "w-2/3" => s.width = Dimension::Percent(200.0 / 3.0),

        "border" => s.border = Edges::all(1.0),
        "border-b" => s.border.bottom = 1.0,
        "border-l-2" => s.border.left = 2.0,

        _ => {
            try_spacing_class(s, class);
            try_color_class(s, class);
            try_gap_class(s, class);
            try_size_class(s, class);
        }
    }
}

/// `p-4`, `px-3`, `mb-1.5`, … (1 unit = 4 pt).
fn try_spacing_class(s: &mut ComputedStyle, class: &str) {
    let Some((prefix, value)) = class.rsplit_once('-') else {
        return;
    };
    let Ok(units) = value.parse::<f32>() else {
        return;
    };
    let v = units * 4.0;
    match prefix {
        "p" => s.padding = Edges::all(v),
        "px" => {
            s.padding.left = v;
            s.padding.right = v;
        }
        "py" => {
            s.padding.top = v;
            s.padding.bottom = v;
        }
        "pt" => s.padding.top = v,
        "pb" => s.padding.bottom = v,
        "pl" => s.padding.left = v,
        "pr" => s.padding.right = v,
        "m" => s.margin = Edges::all(v),
        "mx" => {
            s.margin.left = v;
            s.margin.right = v;
        }
        "my" => {
            s.margin.top = v;
            s.margin.bottom = v;
        }
        "mt" => s.margin.top = v,
        "mb" => s.margin.bottom = v,
        "ml" => s.margin.left = v,
        "mr" => s.margin.right = v,
        _ => {}
    }
}

fn try_color_class(s: &mut ComputedStyle, class: &str) {
    if let Some(c) = class.strip_prefix("text-").and_then(palette) {
        s.color = c;
    } else if let Some(c) = class.strip_prefix("bg-").and_then(palette) {
        s.background_color = c;
    } else if let Some(c) = class.strip_prefix("border-").and_then(palette) {
        s.border_color = c;
    }
}

fn try_gap_class(s: &mut ComputedStyle, class: &str) {
    let parse = |v: &str| v.parse::<f32>().ok().map(|u| u * 4.0);
    if let Some(v) = class.strip_prefix("gap-x-").and_then(parse) {
        s.gap_x = v;
    } else if let Some(v) = class.strip_prefix("gap-y-").and_then(parse) {
        s.gap_y = v;
    } else if let Some(v) = class.strip_prefix("gap-").and_then(parse) {
        s.gap_x = v;
        s.gap_y = v;
    }
}

fn try_size_class(s: &mut ComputedStyle, class: &str) {
    let parse = |v: &str| v.parse::<f32>().ok().map(|u| Dimension::Pt(u * 4.0));
    if let Some(d) = class.strip_prefix("w-").and_then(parse) {
        s.width = d;
    } else if let Some(d) = class.strip_prefix("h-").and_then(parse) {
        s.height = d;
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        apply_css_property(s, prop.trim(), val.trim());
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "font-family" => {
            let family = val
                .split(',')
                .next()
                .unwrap_or(val)
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            if !family.is_empty() {
                s.font_family = family.to_string();
            }
        }
        "font-size" => {
            if let Some(pt) = parse_length(val) {
                s.font_size = pt;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "color" => {
            if let Some(c) = Color::from_hex(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::from_hex(val) {
                s.background_color = c;
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            }
        }
        "margin-bottom" => {
            if let Some(pt) = parse_length(val) {
                s.margin.bottom = pt;
            }
        }
        "padding" => {
            if let Some(pt) = parse_length(val) {
                s.padding = Edges::all(pt);
            }
        }
        _ => {}
    }
}

/// Lengths are points; `px` and `pt` suffixes are both accepted (the
/// capture viewport maps one CSS pixel onto one point).
fn parse_length(s: &str) -> Option<f32> {
    s.trim()
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .trim()
        .parse()
        .ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s).map(Dimension::Pt).unwrap_or(Dimension::Auto)
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Style a single element subtree (the capture target).
pub fn build_styled_element(element: &ElementNode, parent_style: Option<&ComputedStyle>) -> StyledNode {
    let style = resolve_style(element, parent_style);
    let children = build_styled_tree(&element.children, Some(&style));
    StyledNode::Element {
        tag: element.tag.clone(),
        style,
        children,
        attrs: element.attributes.clone(),
    }
}

/// Build a styled tree from DOM nodes, resolving styles top-down.
/// Whitespace-only text is dropped; text nodes carry only inherited
/// properties so box styling never leaks into them.
pub fn build_styled_tree(nodes: &[DomNode], parent_style: Option<&ComputedStyle>) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => result.push(build_styled_element(e, parent_style)),
            DomNode::Text(text) if !text.trim().is_empty() => {
                let style = parent_style
                    .map(ComputedStyle::inherit_text)
                    .unwrap_or_default();
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
            DomNode::Text(_) => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    #[test]
    fn spacing_units() {
        let mut s = ComputedStyle::default();
        apply_utility_class(&mut s, "p-4");
        assert_eq!(s.padding.top, 16.0);
        apply_utility_class(&mut s, "mb-1.5");
        assert_eq!(s.margin.bottom, 6.0);
        apply_utility_class(&mut s, "h-1.5");
        assert_eq!(s.height, Dimension::Pt(6.0));
    }

    #[test]
    fn inline_font_family_and_size() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-family: 'Georgia', serif; font-size: 12px; width: 60%");
        assert_eq!(s.font_family, "Georgia");
        assert_eq!(s.font_size, 12.0);
        assert_eq!(s.width, Dimension::Percent(60.0));
    }

    #[test]
    fn text_sizes_scale_with_base() {
        let tree = DomTree::parse(
            r#"<div style="font-size: 10px"><h1>A</h1><p class="text-xs">B</p></div>"#,
        );
        let root = tree.element_at(&[0]).unwrap();
        let styled = build_styled_element(root, None);
        let StyledNode::Element { children, .. } = styled else {
            panic!("expected element");
        };
        let sizes: Vec<f32> = children
            .iter()
            .map(|c| match c {
                StyledNode::Element { style, .. } => style.font_size,
                StyledNode::Text { style, .. } => style.font_size,
            })
            .collect();
        assert!((sizes[0] - 20.0).abs() < 1e-4);
        assert!((sizes[1] - 8.0).abs() < 1e-4);
    }

    #[test]
    fn palette_colors() {
        let mut s = ComputedStyle::default();
        apply_utility_class(&mut s, "bg-primary");
        apply_utility_class(&mut s, "text-white");
        assert_eq!(s.color, Color::WHITE);
        assert_eq!(s.background_color.to_rgb8(), [0x1d, 0x4e, 0xd8]);
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::from_hex("#abc").unwrap().to_rgb8(), [0xaa, 0xbb, 0xcc]);
        assert!(Color::from_hex("nope").is_none());
    }
}
