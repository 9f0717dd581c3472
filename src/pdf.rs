//! PDF assembler – places paginated bitmap bands onto pages using
//! `printpdf` (v0.8 ops-based API) and draws any text the painter left for
//! the vector text layer.

use ::image::codecs::jpeg::JpegEncoder;
use log::{debug, warn};
use printpdf::*;

use crate::capture::{Bitmap, PT_PER_MM};
use crate::error::ExportError;
use crate::pagination::PageImage;
use crate::scene::TextRun;

/// JPEG quality used for page bands.
pub const JPEG_QUALITY: u8 = 92;

/// Page geometry and metadata of the assembled document.
#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub title: String,
    /// Family the text layer is drawn in; bold and italic come from each run.
    pub font: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
}

/// Assemble one PDF page per band. `bitmap` supplies the pixel scale and
/// the overlay text runs; `pages` must come from paginating its image.
pub fn assemble_pdf(bitmap: &Bitmap, pages: &[PageImage], settings: &PdfSettings) -> Result<Vec<u8>, ExportError> {
    let page_w_pt = settings.page_width_mm * PT_PER_MM;
    let page_h_pt = settings.page_height_mm * PT_PER_MM;
    // Points on the page per point of capture space.
    let capture_to_page = if bitmap.width() > 0 {
        bitmap.pixel_scale * page_w_pt / bitmap.width() as f32
    } else {
        1.0
    };

    let mut doc = PdfDocument::new(&settings.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pdf_pages = Vec::with_capacity(pages.len());

    for page in pages {
        let jpeg = encode_jpeg(page)?;
        let raw = RawImage::decode_from_bytes(&jpeg, &mut warnings)
            .map_err(|e| ExportError::Encode(format!("page {}: {e}", page.index + 1)))?;
        let xobj_id = doc.add_image(&raw);

        let (px_w, px_h) = page.image.dimensions();
        let mut ops = vec![Op::UseXobject {
            id: xobj_id,
            // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                dpi: Some(72.0),
                scale_x: Some(page_w_pt / px_w.max(1) as f32),
                scale_y: Some(page_h_pt / px_h.max(1) as f32),
                rotate: None,
            },
        }];

        // Offset of this page's top edge in capture space, in points.
        let page_top = -(page.offset_px as f32) / bitmap.pixel_scale;
        for run in &bitmap.text_runs {
            let baseline = (run.baseline - page_top) * capture_to_page;
            if baseline <= 0.0 || baseline > page_h_pt {
                continue;
            }
            let font = builtin_font(&settings.font, run.bold, run.italic);
            render_run(&mut ops, run, font, run.x * capture_to_page, page_h_pt - baseline, capture_to_page);
        }

        pdf_pages.push(PdfPage::new(
            Mm(settings.page_width_mm),
            Mm(settings.page_height_mm),
            ops,
        ));
    }

    for w in &warnings {
        warn!("pdf image warning: {w:?}");
    }

    // A document always has at least one page.
    if pdf_pages.is_empty() {
        pdf_pages.push(PdfPage::new(
            Mm(settings.page_width_mm),
            Mm(settings.page_height_mm),
            Vec::new(),
        ));
    }

    debug!("assembled {} pdf page(s)", pdf_pages.len());
    doc.with_pages(pdf_pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

fn encode_jpeg(page: &PageImage) -> Result<Vec<u8>, ExportError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&page.image)
        .map_err(|e| ExportError::Encode(format!("page {}: {e}", page.index + 1)))?;
    Ok(jpeg)
}

/// The builtin face closest to a CSS family name.
pub fn builtin_font(family: &str, bold: bool, italic: bool) -> BuiltinFont {
    let family = family.to_ascii_lowercase();
    let mono = family.contains("mono") || family.contains("courier");
    let serif = !family.contains("sans")
        && (family.contains("serif") || family.contains("times") || family.contains("georgia"));
    match (mono, serif, bold, italic) {
        (true, _, true, true) => BuiltinFont::CourierBoldOblique,
        (true, _, true, false) => BuiltinFont::CourierBold,
        (true, _, false, true) => BuiltinFont::CourierOblique,
        (true, _, false, false) => BuiltinFont::Courier,
        (false, true, true, true) => BuiltinFont::TimesBoldItalic,
        (false, true, true, false) => BuiltinFont::TimesBold,
        (false, true, false, true) => BuiltinFont::TimesItalic,
        (false, true, false, false) => BuiltinFont::TimesRoman,
        (false, false, true, true) => BuiltinFont::HelveticaBoldOblique,
        (false, false, true, false) => BuiltinFont::HelveticaBold,
        (false, false, false, true) => BuiltinFont::HelveticaOblique,
        (false, false, false, false) => BuiltinFont::Helvetica,
    }
}

fn render_run(ops: &mut Vec<Op>, run: &TextRun, font: BuiltinFont, x: f32, y: f32, scale: f32) {
    let [r, g, b] = run.color;
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(run.font_size * scale),
        font,
    });
    ops.push(Op::SetFillColor {
        col: Color::Rgb(Rgb {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            icc_profile: None,
        }),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin(&run.text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // list bullet
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for bytes >= 0x80; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}
