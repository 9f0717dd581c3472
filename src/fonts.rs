//! Font loading and text measurement using `ttf-parser`.
//!
//! Without any font file the manager falls back to synthetic
//! Helvetica-like metrics; text is then measured with an average-advance
//! heuristic and the capture stage leaves glyph painting to the PDF text
//! layer. Once real TTF/OTF bytes are loaded, advances and outlines come
//! from the face itself.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API). Empty for
    /// synthetic metrics.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl FontData {
    pub fn is_synthetic(&self) -> bool {
        self.bytes.is_empty()
    }
}

static SYNTHETIC: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
    line_gap: 0.0,
};

/// Well-known locations of sans-serif faces on Linux and macOS hosts.
const SYSTEM_FONT_CANDIDATES: &[(&str, bool, &str)] = &[
    ("sans", false, "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("sans", true, "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
    ("sans", false, "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    ("sans", true, "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
    ("sans", false, "/usr/share/fonts/dejavu/DejaVuSans.ttf"),
    ("sans", true, "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf"),
    ("sans", false, "/Library/Fonts/Arial.ttf"),
];

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_ascii_lowercase(),
            bold,
            italic,
        }
    }
}

/// Manages loaded fonts.
#[derive(Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// Family used when a requested family has no loaded face.
    default_family: Option<String>,
}

impl FontManager {
    /// A manager with synthetic metrics only.
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_family: None,
        }
    }

    /// Load a TTF/OTF font from bytes. The first family loaded becomes the
    /// fallback for every family without its own face.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), FontError> {
        let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| FontError::Parse(e.to_string()))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        debug!("loaded font face {key:?}");
        if self.default_family.is_none() {
            self.default_family = Some(key.family.clone());
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    pub fn load_font_file(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        path: &Path,
    ) -> Result<(), FontError> {
        let bytes = std::fs::read(path)?;
        self.load_font(family, bold, italic, bytes)
    }

    /// Register the first sans-serif faces found at well-known system paths.
    /// Returns the number of faces loaded.
    pub fn discover_system_fonts(&mut self) -> usize {
        let mut loaded = 0;
        for (family, bold, path) in SYSTEM_FONT_CANDIDATES {
            if self.fonts.contains_key(&FontKey::new(family, *bold, false)) {
                continue;
            }
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match self.load_font_file(family, *bold, false, path) {
                Ok(()) => {
                    info!("using system font {}", path.display());
                    loaded += 1;
                }
                Err(e) => debug!("skipping {}: {e}", path.display()),
            }
        }
        loaded
    }

    /// Font data for a key: exact match, then the same weight in the
    /// default family, then its regular face, then synthetic metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        if let Some(data) = self.fonts.get(key) {
            return data;
        }
        if let Some(default) = &self.default_family {
            let candidates = [
                FontKey::new(default, key.bold, key.italic),
                FontKey::new(default, key.bold, false),
                FontKey::new(default, false, false),
            ];
            if let Some(data) = candidates.iter().find_map(|k| self.fonts.get(k)) {
                return data;
            }
        }
        &SYNTHETIC
    }

    /// Parsed face for a key, or `None` when only synthetic metrics exist.
    pub fn face(&self, family: &str, bold: bool, italic: bool) -> Option<ttf_parser::Face<'_>> {
        let data = self.get(&FontKey::new(family, bold, italic));
        if data.is_synthetic() {
            return None;
        }
        ttf_parser::Face::parse(&data.bytes, 0).ok()
    }

    /// Measure the width of a string at a given font size (in pt).
    /// With real font bytes the glyph advances are summed; otherwise an
    /// average character width heuristic is used (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));
        if data.is_synthetic() {
            // Bold is ~10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));
        data.ascender * font_size / data.units_per_em
    }

    pub fn descender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.get(&FontKey::new(family, bold, italic));
        data.descender * font_size / data.units_per_em
    }

    /// True when at least one real face is loaded.
    pub fn has_real_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-wrap text to fit within `max_width`. Returns one entry per line;
/// a single word wider than the limit keeps its own line.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
