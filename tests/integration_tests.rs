//! Integration tests for the resume-forge pipeline.
//!
//! These tests validate:
//! - Schema validation reports violations at their paths and round-trips
//! - Templates render the expected sections and labels
//! - PDF export paginates onto the requested paper size
//! - DOCX export is stable and carries the requested font size
//! - Failed exports leave nothing behind

use std::io::{Cursor, Read};
use std::sync::Arc;

use image::RgbImage;
use sha2::{Digest, Sha256};

use resume_forge::dom::{text_content, DomTree, NO_PRINT_CLASS};
use resume_forge::download::{DirectorySink, MemorySink};
use resume_forge::error::ExportError;
use resume_forge::export::{ExportOptions, Exporter, PageSize, DEFAULT_DOCX_NAME, DEFAULT_PDF_NAME};
use resume_forge::model::{Experience, ResumeDocument, Skill};
use resume_forge::notify::{Notice, RecordingNotifier};
use resume_forge::pagination::{band_height_px, paginate};
use resume_forge::templates::{render, render_with, Layout, RenderOptions, PREVIEW_CONTAINER_ID};
use resume_forge::validation::{validate, validate_json};

// =====================================================================
// Helpers
// =====================================================================

const JANE: &str = r#"{
    "personalInfo": {
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jane@example.com",
        "phone": "555-0100"
    },
    "experiences": [
        {
            "id": "exp-1",
            "company": "Acme",
            "position": "Engineer",
            "startDate": "2020-01",
            "current": true
        }
    ],
    "template": { "style": "modern" }
}"#;

fn jane() -> ResumeDocument {
    validate_json(JANE).expect("fixture is valid")
}

fn memory_exporter() -> (Exporter, Arc<RecordingNotifier>, Arc<MemorySink>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let sink = Arc::new(MemorySink::new());
    (Exporter::new(notifier.clone(), sink.clone()), notifier, sink)
}

fn preview_text(tree: &DomTree) -> String {
    let path = tree.find_path_by_id(PREVIEW_CONTAINER_ID).unwrap();
    text_content(tree.element_at(&path).unwrap())
}

fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
    out
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// Every `/MediaBox [x0 y0 x1 y1]` in the file, in points.
fn media_boxes(bytes: &[u8]) -> Vec<[f32; 4]> {
    const KEY: &[u8] = b"/MediaBox";
    let mut boxes = Vec::new();
    let mut at = 0;
    while let Some(pos) = bytes[at..].windows(KEY.len()).position(|w| w == KEY) {
        let rest = &bytes[at + pos + KEY.len()..];
        let open = rest.iter().position(|&b| b == b'[').unwrap();
        let close = rest.iter().position(|&b| b == b']').unwrap();
        let nums: Vec<f32> = String::from_utf8_lossy(&rest[open + 1..close])
            .split_whitespace()
            .map(|n| n.parse().unwrap())
            .collect();
        boxes.push([nums[0], nums[1], nums[2], nums[3]]);
        at += pos + KEY.len();
    }
    boxes
}

// =====================================================================
// Validation
// =====================================================================

#[test]
fn valid_resume_has_no_violations() {
    let doc = jane();
    assert_eq!(doc.personal_info.full_name(), "Jane Doe");
    assert!(doc.experiences[0].current);
    assert!(doc.skills.is_empty());
}

#[test]
fn missing_email_is_reported_at_its_path() {
    let json = JANE.replace(r#""email": "jane@example.com","#, "");
    let err = validate_json(&json).unwrap_err();
    assert!(err.has_violation_at("personalInfo.email"), "{:?}", err.paths());
    assert_eq!(err.violations.len(), 1);
}

#[test]
fn every_violation_is_listed() {
    let json = r#"{
        "personalInfo": { "firstName": "", "lastName": "Doe", "email": "nope", "phone": "1" },
        "experiences": [{ "id": "a", "company": "", "position": "Dev", "startDate": "2020" }],
        "skills": [{ "id": "s", "name": "Rust", "level": 9 }]
    }"#;
    let err = validate_json(json).unwrap_err();
    for path in [
        "personalInfo.firstName",
        "personalInfo.email",
        "personalInfo.phone",
        "experiences[0].company",
        "skills[0].level",
    ] {
        assert!(err.has_violation_at(path), "missing {path} in {:?}", err.paths());
    }
}

#[test]
fn validated_document_round_trips() {
    let mut doc = jane();
    doc.add_skill(Skill::new("Rust", Some(5)));
    let again = validate(&serde_json::to_value(&doc).unwrap()).unwrap();
    assert_eq!(again, doc);
}

// =====================================================================
// Templates
// =====================================================================

#[test]
fn jane_modern_shows_present_and_no_skills() {
    let doc = jane();
    assert_eq!(Layout::for_style(doc.template.style), Layout::Modern);
    let text = preview_text(&render(&doc, "Arial", 11.0));
    assert!(text.contains("Jane Doe"));
    assert!(text.contains("Acme"));
    assert!(text.contains("2020-01 - Present"));
    assert!(!text.contains("Skills"));
}

#[test]
fn unknown_style_falls_back_to_minimal() {
    // The schema rejects the name, but rendering by name never fails.
    let json = JANE.replace(r#""style": "modern""#, r#""style": "nonexistent""#);
    assert!(validate_json(&json).unwrap_err().has_violation_at("template.style"));

    let layout = Layout::resolve("nonexistent");
    assert_eq!(layout, Layout::Minimal);
    let options = RenderOptions {
        layout: Some(layout),
        ..RenderOptions::default()
    };
    let minimal = render_with(&jane(), &options);
    let text = preview_text(&minimal);
    assert!(text.contains("Jane Doe"));
    // The modern sidebar heading is absent.
    assert!(!text.contains("Contact"));
}

// =====================================================================
// Pagination
// =====================================================================

#[test]
fn exact_multiples_paginate_exactly() {
    let (w, h) = PageSize::Letter.dimensions_mm();
    let width = 612;
    let band = band_height_px(width, f64::from(w), f64::from(h));
    for k in 1..=3u32 {
        assert_eq!(paginate(&RgbImage::new(width, band * k), w.into(), h.into()).len(), k as usize);
    }
    assert_eq!(paginate(&RgbImage::new(width, band + 1), w.into(), h.into()).len(), 2);
    assert_eq!(paginate(&RgbImage::new(width, 1), w.into(), h.into()).len(), 1);
}

// =====================================================================
// PDF export
// =====================================================================

#[test]
fn letter_export_uses_letter_pages() {
    let (exporter, notifier, sink) = memory_exporter();
    let mut tree = render(&jane(), "Arial", 11.0);
    let options = ExportOptions {
        page_size: PageSize::Letter,
        ..ExportOptions::default()
    };
    let file = exporter
        .try_export_pdf(&mut tree, PREVIEW_CONTAINER_ID, &options)
        .unwrap();
    assert_eq!(file.page_size_mm, Some((216.0, 279.0)));
    assert_eq!(file.page_count, 1);
    let bytes = sink.get(DEFAULT_PDF_NAME).unwrap();
    assert_valid_pdf(&bytes);

    // 216 x 279 mm is 612.3 x 790.9 pt; A4 would be 595.3 x 841.9.
    let boxes = media_boxes(&bytes);
    assert!(!boxes.is_empty());
    for [x0, y0, x1, y1] in boxes {
        assert!(((x1 - x0) - 612.3).abs() < 1.0, "width {}", x1 - x0);
        assert!(((y1 - y0) - 790.9).abs() < 1.0, "height {}", y1 - y0);
    }
    // The try_ variant leaves notifications to the caller.
    assert!(notifier.notices().is_empty());
}

#[test]
fn long_resume_spans_several_pages() {
    let mut doc = jane();
    for i in 0..40 {
        let mut exp = Experience::new(&format!("Company {i}"), "Engineer", "2015-01");
        exp.end_date = Some("2016-01".into());
        exp.description = Some("Built and shipped things.\nLed a team of four.".into());
        doc.add_experience(exp);
    }
    let (exporter, _, sink) = memory_exporter();
    let mut tree = render(&doc, "Arial", 11.0);
    let file = exporter
        .try_export_pdf(&mut tree, PREVIEW_CONTAINER_ID, &ExportOptions::default())
        .unwrap();
    assert!(file.page_count > 1, "expected several pages, got {}", file.page_count);
    assert_eq!(file.bytes_len, sink.get(DEFAULT_PDF_NAME).unwrap().len());
}

#[test]
fn excluded_nodes_are_restored_after_export() {
    let html = format!(
        r#"<div id="{PREVIEW_CONTAINER_ID}"><p>Jane</p><section style="color: #333"><p>Private</p></section><div class="{NO_PRINT_CLASS}">Edit</div></div>"#
    );
    let mut tree = DomTree::parse(&html);
    let root = tree.find_path_by_id(PREVIEW_CONTAINER_ID).unwrap();
    let mut section = root.clone();
    section.push(1);

    let (exporter, notifier, _) = memory_exporter();
    let options = ExportOptions {
        exclude: vec![section.clone()],
        ..ExportOptions::default()
    };
    assert!(exporter.export_pdf(&mut tree, PREVIEW_CONTAINER_ID, &options));
    assert_eq!(tree.element_at(&section).unwrap().inline_style(), Some("color: #333"));
    let no_print = tree.paths_with_class(&root, NO_PRINT_CLASS);
    assert_eq!(tree.element_at(&no_print[0]).unwrap().inline_style(), None);
    assert!(matches!(notifier.notices().last(), Some(Notice::Success(_))));
}

#[test]
fn missing_target_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let notifier = Arc::new(RecordingNotifier::new());
    let exporter = Exporter::new(notifier.clone(), Arc::new(DirectorySink::new(&out)));
    let mut tree = render(&jane(), "Arial", 11.0);

    assert!(!exporter.export_pdf(&mut tree, "nonexistent", &ExportOptions::default()));
    assert!(!exporter.export_docx(&mut tree, "nonexistent", &ExportOptions::default()));
    assert!(!out.exists() || std::fs::read_dir(&out).unwrap().count() == 0);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 6);
    assert!(matches!(notices[2], Notice::Error(_)));
    assert!(matches!(notices[5], Notice::Error(_)));
}

#[test]
fn overlapping_export_conflicts() {
    let (exporter, _, sink) = memory_exporter();
    let mut tree = render(&jane(), "Arial", 11.0);
    let lease = exporter.locks().try_acquire(PREVIEW_CONTAINER_ID).unwrap();
    let err = exporter
        .try_export_docx(&mut tree, PREVIEW_CONTAINER_ID, &ExportOptions::default())
        .unwrap_err();
    assert!(matches!(err, ExportError::Conflict(_)));
    drop(lease);
    assert!(sink.is_empty());
    assert!(exporter.export_docx(&mut tree, PREVIEW_CONTAINER_ID, &ExportOptions::default()));
}

#[test]
fn directory_export_writes_final_file() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(Arc::new(RecordingNotifier::new()), Arc::new(DirectorySink::new(dir.path())));
    let mut tree = render(&jane(), "Arial", 11.0);
    let file = exporter
        .try_export_pdf(&mut tree, PREVIEW_CONTAINER_ID, &ExportOptions::default())
        .unwrap();
    assert_eq!(file.path, dir.path().join(DEFAULT_PDF_NAME));
    assert_valid_pdf(&std::fs::read(&file.path).unwrap());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

// =====================================================================
// DOCX export
// =====================================================================

#[test]
fn docx_carries_half_point_size_and_text() {
    let (exporter, _, sink) = memory_exporter();
    let mut tree = render(&jane(), "Georgia", 11.0);
    let options = ExportOptions {
        font: "Georgia".into(),
        font_size_pt: 11.0,
        ..ExportOptions::default()
    };
    assert!(exporter.export_docx(&mut tree, PREVIEW_CONTAINER_ID, &options));
    let bytes = sink.get(DEFAULT_DOCX_NAME).unwrap();

    let styles = docx_part(&bytes, "word/styles.xml");
    assert!(styles.contains(r#"<w:sz w:val="22"/>"#));
    assert!(styles.contains(r#"w:ascii="Georgia""#));
    let document = docx_part(&bytes, "word/document.xml");
    assert!(document.contains("<w:t>Resume</w:t>"));
    assert!(document.contains("Jane Doe"));
    assert!(document.contains("2020-01 - Present"));
}

#[test]
fn repeated_docx_exports_are_identical() {
    let (exporter, _, sink) = memory_exporter();
    let doc = jane();
    let digest = |name: &str| {
        let mut tree = render(&doc, "Arial", 11.0);
        let options = ExportOptions {
            file_name: Some(name.to_string()),
            ..ExportOptions::default()
        };
        assert!(exporter.export_docx(&mut tree, PREVIEW_CONTAINER_ID, &options));
        Sha256::digest(sink.get(name).unwrap())
    };
    assert_eq!(digest("a.docx"), digest("b.docx"));
}
