//! Capture – rasterizes one element of a rendered [`DomTree`] into a bitmap.
//!
//! The stages mirror a browser screenshot: excluded elements are switched
//! off for the duration of the capture, styles are resolved, the element
//! is laid out at the viewport width, frozen into a [`Scene`] and painted.

use std::ops::{Deref, DerefMut};

use image::RgbImage;
use log::{debug, warn};

use crate::dom::{DomTree, NodePath};
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::raster::paint;
use crate::scene::{Scene, TextRun};
use crate::style::build_styled_element;

/// Declaration appended to an excluded element's `style` attribute.
const HIDE_DECLARATION: &str = "display: none";

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Knobs of a single capture.
#[derive(Clone)]
pub struct CaptureSettings {
    /// Width the element is laid out at, in points.
    pub viewport_width_pt: f32,
    pub fonts: FontManager,
}

impl CaptureSettings {
    pub fn for_page_width_mm(page_width_mm: f32, fonts: FontManager) -> Self {
        Self {
            viewport_width_pt: page_width_mm * PT_PER_MM,
            fonts,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::for_page_width_mm(210.0, FontManager::default())
    }
}

/// A captured element.
#[derive(Debug)]
pub struct Bitmap {
    pub image: RgbImage,
    /// Pixels per point.
    pub pixel_scale: f32,
    /// Text left for the PDF text layer, in points from the bitmap's top-left.
    pub text_runs: Vec<TextRun>,
}

impl Bitmap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

// ---------------------------------------------------------------------------
// Scoped exclusion
// ---------------------------------------------------------------------------

/// Hides a set of elements while alive and restores their previous `style`
/// attributes when dropped, even if the capture fails or panics.
pub struct HiddenScope<'a> {
    tree: &'a mut DomTree,
    saved: Vec<(NodePath, Option<String>)>,
}

impl<'a> HiddenScope<'a> {
    /// Hide every element at `paths`. Paths that do not address an element
    /// are skipped with a warning.
    pub fn new(tree: &'a mut DomTree, paths: &[NodePath]) -> Self {
        let mut scope = Self {
            tree,
            saved: Vec::with_capacity(paths.len()),
        };
        for path in paths {
            if !scope.append_style(path, HIDE_DECLARATION) {
                warn!("excluded node {path:?} does not exist; skipping");
            }
        }
        debug!("hid {} element(s) for capture", scope.saved.len());
        scope
    }

    /// Append `declarations` to the `style` of the element at `path` until
    /// the scope ends. Later declarations win, so this overrides the
    /// element's own values. Returns `false` if there is no element there.
    pub fn append_style(&mut self, path: &[usize], declarations: &str) -> bool {
        let Some(element) = self.tree.element_at_mut(path) else {
            return false;
        };
        let previous = element.attributes.get("style").cloned();
        let styled = match previous.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => {
                format!("{}; {declarations}", s.trim_end_matches(';'))
            }
            _ => declarations.to_string(),
        };
        element.attributes.insert("style".to_string(), styled);
        self.saved.push((path.to_vec(), previous));
        true
    }
}

impl Deref for HiddenScope<'_> {
    type Target = DomTree;

    fn deref(&self) -> &DomTree {
        &*self.tree
    }
}

impl DerefMut for HiddenScope<'_> {
    fn deref_mut(&mut self) -> &mut DomTree {
        &mut *self.tree
    }
}

impl Drop for HiddenScope<'_> {
    fn drop(&mut self) {
        // Reverse order so nested exclusions unwind correctly.
        for (path, previous) in self.saved.drain(..).rev() {
            if let Some(element) = self.tree.element_at_mut(&path) {
                match previous {
                    Some(style) => {
                        element.attributes.insert("style".to_string(), style);
                    }
                    None => {
                        element.attributes.remove("style");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// Rasterize the element at `path` at `pixel_scale` pixels per point.
pub fn rasterize(
    tree: &DomTree,
    path: &[usize],
    pixel_scale: f32,
    settings: &CaptureSettings,
) -> Result<Bitmap, ExportError> {
    let element = tree
        .element_at(path)
        .ok_or_else(|| ExportError::NotFound(format!("{path:?}")))?;

    let styled = build_styled_element(element, None);
    let root = compute_layout(&styled, settings.viewport_width_pt, &settings.fonts)?;
    let scene = Scene::from_layout(&root, &settings.fonts);
    debug!(
        "captured scene {:.1}x{:.1} pt with {} items",
        scene.width,
        scene.height,
        scene.items.len()
    );

    let painted = paint(&scene, pixel_scale, &settings.fonts)?;
    Ok(Bitmap {
        image: painted.image,
        pixel_scale,
        text_runs: painted.overlay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NO_PRINT_CLASS;
    use crate::style::resolve_style;

    const HTML: &str = r#"<div id="target"><p>Keep</p><div class="no-print" style="color: #f00">Drop</div><p class="no-print">Also</p></div>"#;

    #[test]
    fn hidden_scope_restores_styles() {
        let mut tree = DomTree::parse(HTML);
        let target = tree.find_path_by_id("target").unwrap();
        let excluded = tree.paths_with_class(&target, NO_PRINT_CLASS);
        assert_eq!(excluded.len(), 2);
        {
            let scope = HiddenScope::new(&mut tree, &excluded);
            assert!(scope.element_at(&excluded[0]).unwrap().is_hidden());
            assert_eq!(
                scope.element_at(&excluded[0]).unwrap().inline_style(),
                Some("color: #f00; display: none")
            );
            assert!(scope.element_at(&excluded[1]).unwrap().is_hidden());
        }
        assert_eq!(
            tree.element_at(&excluded[0]).unwrap().inline_style(),
            Some("color: #f00")
        );
        assert_eq!(tree.element_at(&excluded[1]).unwrap().inline_style(), None);
    }

    #[test]
    fn appended_style_overrides_until_dropped() {
        let mut tree = DomTree::parse(r#"<div id="target" style="font-family: Arial; font-size: 11px"><p>Hi</p></div>"#);
        let target = tree.find_path_by_id("target").unwrap();
        {
            let mut scope = HiddenScope::new(&mut tree, &[]);
            assert!(scope.append_style(&target, "font-family: Georgia; font-size: 14px"));
            assert!(!scope.append_style(&[9], "color: #000"));
            let element = scope.element_at(&target).unwrap();
            let style = resolve_style(element, None);
            assert_eq!(style.font_family, "Georgia");
            assert_eq!(style.font_size, 14.0);
        }
        assert_eq!(
            tree.element_at(&target).unwrap().inline_style(),
            Some("font-family: Arial; font-size: 11px")
        );
    }

    #[test]
    fn hidden_scope_restores_on_panic() {
        let mut tree = DomTree::parse(HTML);
        let excluded = tree.paths_with_class(&[0], NO_PRINT_CLASS);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = HiddenScope::new(&mut tree, &excluded);
            panic!("capture blew up");
        }));
        assert!(result.is_err());
        assert_eq!(tree.element_at(&excluded[1]).unwrap().inline_style(), None);
    }

    #[test]
    fn excluded_text_is_not_captured() {
        let mut tree = DomTree::parse(HTML);
        let target = tree.find_path_by_id("target").unwrap();
        let excluded = tree.paths_with_class(&target, NO_PRINT_CLASS);
        let settings = CaptureSettings::default();
        let bitmap = {
            let scope = HiddenScope::new(&mut tree, &excluded);
            rasterize(&scope, &target, 1.0, &settings).unwrap()
        };
        let texts: Vec<_> = bitmap.text_runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Keep"]);
        let expected = (210.0 * PT_PER_MM).ceil() as i64;
        assert!((bitmap.width() as i64 - expected).abs() <= 1);
    }

    #[test]
    fn missing_path_is_not_found() {
        let tree = DomTree::parse(HTML);
        let err = rasterize(&tree, &[7], 1.0, &CaptureSettings::default()).unwrap_err();
        assert!(matches!(err, ExportError::NotFound(_)));
    }
}
