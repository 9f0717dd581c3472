//! Export orchestration – capture a rendered resume element and deliver it
//! as a paginated PDF or a plain-text DOCX.
//!
//! Every call runs to completion synchronously. Failures never escape
//! [`Exporter::export_pdf`] / [`Exporter::export_docx`]: they are logged,
//! surfaced through the [`Notifier`] and reported as `false`. The `try_*`
//! variants return the underlying [`ExportError`] instead.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::capture::{rasterize, CaptureSettings, HiddenScope};
use crate::docx::{build_docx, DocxStyle};
use crate::dom::{text_content, DomTree, NodePath, NO_PRINT_CLASS};
use crate::download::DownloadSink;
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::notify::Notifier;
use crate::pagination::paginate;
use crate::pdf::{assemble_pdf, PdfSettings};

/// Capture pixels per point before the device pixel ratio is applied.
pub const BASE_CAPTURE_SCALE: f32 = 2.0;
pub const MIN_CAPTURE_SCALE: f32 = 1.0;
pub const MAX_CAPTURE_SCALE: f32 = 6.0;

pub const DEFAULT_PDF_NAME: &str = "resume.pdf";
pub const DEFAULT_DOCX_NAME: &str = "resume.docx";
pub const DEFAULT_FONT: &str = "Arial";
pub const DEFAULT_FONT_SIZE_PT: f32 = 11.0;
pub const DOCUMENT_TITLE: &str = "Resume";

const PDF_LOADING: &str = "Preparing your PDF...";
const PDF_SUCCESS: &str = "PDF successfully downloaded!";
const PDF_FAILURE: &str = "Failed to export PDF. Please try again.";
const DOCX_LOADING: &str = "Preparing your DOCX...";
const DOCX_SUCCESS: &str = "DOCX downloaded successfully!";
const DOCX_FAILURE: &str = "Failed to generate DOCX. Please try again.";

/// Paper sizes offered for PDF export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// `(width, height)` in millimetres.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (216.0, 279.0),
            PageSize::Legal => (216.0, 356.0),
        }
    }
}

/// Options of one export call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Name handed to the sink; defaults depend on the format.
    pub file_name: Option<String>,
    pub page_size: PageSize,
    pub font: String,
    pub font_size_pt: f32,
    pub device_pixel_ratio: f32,
    /// Nodes left out of the capture in addition to every `no-print`
    /// element under the target.
    pub exclude: Vec<NodePath>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            page_size: PageSize::A4,
            font: DEFAULT_FONT.to_string(),
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            device_pixel_ratio: 1.0,
            exclude: Vec::new(),
        }
    }
}

impl ExportOptions {
    /// Capture scale for these options, clamped to the supported range.
    pub fn pixel_scale(&self) -> f32 {
        let dpr = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        (BASE_CAPTURE_SCALE * dpr).clamp(MIN_CAPTURE_SCALE, MAX_CAPTURE_SCALE)
    }

    /// Inline declarations that put the chosen font on the captured element.
    fn font_declarations(&self) -> String {
        let family: String = self
            .font
            .chars()
            .filter(|c| !matches!(c, ';' | ':' | '"' | '\''))
            .collect();
        let mut decls = Vec::new();
        if !family.trim().is_empty() {
            decls.push(format!("font-family: {}", family.trim()));
        }
        if self.font_size_pt.is_finite() && self.font_size_pt > 0.0 {
            decls.push(format!("font-size: {}px", self.font_size_pt));
        }
        decls.join("; ")
    }

    fn file_name_or(&self, default: &str) -> String {
        self.file_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: std::path::PathBuf,
    pub bytes_len: usize,
    /// Zero for DOCX.
    pub page_count: usize,
    pub page_size_mm: Option<(f32, f32)>,
}

// ---------------------------------------------------------------------------
// In-flight tracking
// ---------------------------------------------------------------------------

/// Targets with an export in flight.
#[derive(Debug, Default)]
pub struct ExportLocks {
    in_flight: Mutex<HashSet<String>>,
}

impl ExportLocks {
    /// Claim `target`, or fail with [`ExportError::Conflict`] if it is taken.
    pub fn try_acquire(&self, target: &str) -> Result<ExportLease<'_>, ExportError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| ExportError::Capture("export lock table poisoned".to_string()))?;
        if !in_flight.insert(target.to_string()) {
            return Err(ExportError::Conflict(target.to_string()));
        }
        Ok(ExportLease {
            locks: self,
            target: target.to_string(),
        })
    }

    pub fn is_locked(&self, target: &str) -> bool {
        self.in_flight
            .lock()
            .map(|s| s.contains(target))
            .unwrap_or(false)
    }
}

/// Releases its target when dropped.
#[derive(Debug)]
pub struct ExportLease<'a> {
    locks: &'a ExportLocks,
    target: String,
}

impl Drop for ExportLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.locks.in_flight.lock() {
            in_flight.remove(&self.target);
        }
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Runs exports against rendered trees and hands finished files to a sink.
pub struct Exporter {
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn DownloadSink>,
    locks: ExportLocks,
    fonts: FontManager,
}

impl Exporter {
    pub fn new(notifier: Arc<dyn Notifier>, sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            notifier,
            sink,
            locks: ExportLocks::default(),
            fonts: FontManager::default(),
        }
    }

    /// Use `fonts` for measurement and glyph painting.
    pub fn with_fonts(mut self, fonts: FontManager) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn locks(&self) -> &ExportLocks {
        &self.locks
    }

    /// Export the element with id `node_id` as a PDF. Returns whether the
    /// file was delivered.
    pub fn export_pdf(&self, tree: &mut DomTree, node_id: &str, options: &ExportOptions) -> bool {
        self.notifier.loading(PDF_LOADING);
        let result = self.try_export_pdf(tree, node_id, options);
        self.report(result, PDF_SUCCESS, PDF_FAILURE)
    }

    /// Export the text of the element with id `node_id` as a DOCX. Returns
    /// whether the file was delivered.
    pub fn export_docx(&self, tree: &mut DomTree, node_id: &str, options: &ExportOptions) -> bool {
        self.notifier.loading(DOCX_LOADING);
        let result = self.try_export_docx(tree, node_id, options);
        self.report(result, DOCX_SUCCESS, DOCX_FAILURE)
    }

    fn report(&self, result: Result<ExportedFile, ExportError>, success: &str, failure: &str) -> bool {
        self.notifier.dismiss();
        match result {
            Ok(file) => {
                info!("exported {} ({} bytes)", file.path.display(), file.bytes_len);
                self.notifier.success(success);
                true
            }
            Err(e) => {
                error!("export failed: {e}");
                self.notifier.error(failure);
                false
            }
        }
    }

    pub fn try_export_pdf(
        &self,
        tree: &mut DomTree,
        node_id: &str,
        options: &ExportOptions,
    ) -> Result<ExportedFile, ExportError> {
        let _lease = self.locks.try_acquire(node_id)?;
        let target = tree
            .find_path_by_id(node_id)
            .ok_or_else(|| ExportError::NotFound(node_id.to_string()))?;

        let (page_w, page_h) = options.page_size.dimensions_mm();
        let pixel_scale = options.pixel_scale();
        let settings = CaptureSettings::for_page_width_mm(page_w, self.fonts.clone());

        let mut excluded = options.exclude.clone();
        for path in tree.paths_with_class(&target, NO_PRINT_CLASS) {
            if !excluded.contains(&path) {
                excluded.push(path);
            }
        }

        let bitmap = {
            let mut scope = HiddenScope::new(tree, &excluded);
            let font = options.font_declarations();
            if !font.is_empty() {
                scope.append_style(&target, &font);
            }
            rasterize(&scope, &target, pixel_scale, &settings)?
        };
        debug!(
            "captured `{node_id}` at {pixel_scale}x: {}x{} px",
            bitmap.width(),
            bitmap.height()
        );

        let pages = paginate(&bitmap.image, f64::from(page_w), f64::from(page_h));
        let pdf = assemble_pdf(
            &bitmap,
            &pages,
            &PdfSettings {
                title: DOCUMENT_TITLE.to_string(),
                font: options.font.clone(),
                page_width_mm: page_w,
                page_height_mm: page_h,
            },
        )?;

        let path = self.sink.save(&options.file_name_or(DEFAULT_PDF_NAME), &pdf)?;
        Ok(ExportedFile {
            path,
            bytes_len: pdf.len(),
            page_count: pages.len().max(1),
            page_size_mm: Some((page_w, page_h)),
        })
    }

    pub fn try_export_docx(
        &self,
        tree: &mut DomTree,
        node_id: &str,
        options: &ExportOptions,
    ) -> Result<ExportedFile, ExportError> {
        let _lease = self.locks.try_acquire(node_id)?;
        let target = tree
            .find_path_by_id(node_id)
            .ok_or_else(|| ExportError::NotFound(node_id.to_string()))?;
        let element = tree
            .element_at(&target)
            .ok_or_else(|| ExportError::NotFound(node_id.to_string()))?;

        let text = text_content(element);
        let docx = build_docx(
            &text,
            &DocxStyle {
                font: options.font.clone(),
                font_size_pt: options.font_size_pt,
            },
        )?;

        let path = self.sink.save(&options.file_name_or(DEFAULT_DOCX_NAME), &docx)?;
        Ok(ExportedFile {
            path,
            bytes_len: docx.len(),
            page_count: 0,
            page_size_mm: None,
        })
    }
}
