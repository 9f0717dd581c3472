//! # resume-forge – structured resumes rendered to paginated PDF and DOCX
//!
//! A resume is a schema-validated [`model::ResumeDocument`]. Exporting it
//! runs through these stages:
//!
//! 1. **Validate** – JSON → typed document with every violation reported ([`validation`])
//! 2. **Template** – document + style → markup → DOM tree ([`templates`], [`dom`])
//! 3. **Style** – tag defaults, utility classes and inline styles ([`style`])
//! 4. **Layout** – flexbox layout with Taffy at the page width ([`layout`])
//! 5. **Capture** – layout → scene → RGB bitmap ([`scene`], [`raster`], [`capture`])
//! 6. **Paginate** – bitmap → page-sized bands ([`pagination`])
//! 7. **Assemble** – bands → PDF via printpdf ([`pdf`]), or text → DOCX ([`docx`])
//!
//! [`export::Exporter`] drives stages 5–7 for an element of a rendered tree
//! and hands finished files to a [`download::DownloadSink`].

pub mod capture;
pub mod docx;
pub mod dom;
pub mod download;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod pdf;
pub mod raster;
pub mod scene;
pub mod session;
pub mod storage;
pub mod style;
pub mod templates;
pub mod validation;

// Re-exports for convenience
pub use error::{ExportError, StoreError, ValidationError};
pub use export::{ExportOptions, Exporter, PageSize};
pub use model::ResumeDocument;
pub use templates::{render, Layout, PREVIEW_CONTAINER_ID};
pub use validation::{validate, validate_json};
