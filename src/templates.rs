//! Resume templates – render a [`ResumeDocument`] into the markup subset the
//! style engine understands, then parse it into a [`DomTree`].
//!
//! Three layouts exist. Every template style name maps onto one of them and
//! unknown names fall back to [`Layout::Minimal`]. Rendering is pure: the
//! document is only read, and empty sections are left out entirely.

use std::fmt::Write as _;

use log::debug;

use crate::dom::{escape_html, DomTree};
use crate::model::{
    Achievement, Certificate, Education, Experience, Hobby, Language, ResumeDocument, Skill,
    TemplateRole, TemplateStyle, MAX_SKILL_LEVEL,
};

/// Id of the element every export targets.
pub const PREVIEW_CONTAINER_ID: &str = "resume-preview-container";

/// Fonts offered to the user.
pub const FONT_CHOICES: &[&str] = &["Arial", "Times New Roman", "Courier New", "Georgia", "Verdana"];

/// Page structure a template style is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Single column.
    Minimal,
    /// Sidebar with contact details and skill bars beside a main column.
    Modern,
    /// Banner header above a two-column body.
    Professional,
}

impl Layout {
    pub fn for_style(style: TemplateStyle) -> Self {
        match style {
            TemplateStyle::Minimal => Layout::Minimal,
            TemplateStyle::Modern | TemplateStyle::Creative | TemplateStyle::Bold => Layout::Modern,
            TemplateStyle::Professional
            | TemplateStyle::Academic
            | TemplateStyle::Executive
            | TemplateStyle::Technical
            | TemplateStyle::Elegant
            | TemplateStyle::Simple => Layout::Professional,
        }
    }

    /// Layout for a raw style name. Never fails.
    pub fn resolve(name: &str) -> Self {
        match TemplateStyle::from_name(&name.trim().to_ascii_lowercase()) {
            Some(style) => Self::for_style(style),
            None => {
                debug!("unknown template style `{name}`, using minimal");
                Layout::Minimal
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Minimal => "minimal",
            Layout::Modern => "modern",
            Layout::Professional => "professional",
        }
    }
}

/// A selectable template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateInfo {
    pub layout: Layout,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CATALOGUE: [TemplateInfo; 3] = [
    TemplateInfo {
        layout: Layout::Minimal,
        name: "Minimal",
        description: "Clean and simple design with a focus on content",
    },
    TemplateInfo {
        layout: Layout::Modern,
        name: "Modern",
        description: "Contemporary design with a two-column layout",
    },
    TemplateInfo {
        layout: Layout::Professional,
        name: "Professional",
        description: "Traditional layout ideal for corporate environments",
    },
];

/// Templates offered for `role`. Every layout suits every role today; the
/// role only ever narrows this list.
pub fn templates_for_role(role: Option<TemplateRole>) -> Vec<TemplateInfo> {
    if let Some(role) = role {
        debug!("offering all templates for role {role:?}");
    }
    CATALOGUE.to_vec()
}

/// Typography and layout override for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub font_family: String,
    pub font_size_pt: f32,
    /// Replaces the layout chosen by the document's template style.
    pub layout: Option<Layout>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            font_family: FONT_CHOICES[0].to_string(),
            font_size_pt: 11.0,
            layout: None,
        }
    }
}

/// Render `document` with the given typography into a parsed tree whose
/// root element has id [`PREVIEW_CONTAINER_ID`].
pub fn render(document: &ResumeDocument, font_family: &str, font_size_pt: f32) -> DomTree {
    render_with(
        document,
        &RenderOptions {
            font_family: font_family.to_string(),
            font_size_pt,
            layout: None,
        },
    )
}

pub fn render_with(document: &ResumeDocument, options: &RenderOptions) -> DomTree {
    DomTree::parse(&render_html(document, options))
}

/// The markup `render` parses.
pub fn render_html(document: &ResumeDocument, options: &RenderOptions) -> String {
    let layout = options
        .layout
        .unwrap_or_else(|| Layout::for_style(document.template.style));
    let body = match layout {
        Layout::Minimal => minimal(document),
        Layout::Modern => modern(document),
        Layout::Professional => professional(document),
    };
    debug!("rendered {} layout ({} bytes)", layout.name(), body.len());

    let family = options.font_family.replace(['"', ';'], "");
    format!(
        r#"<div id="{PREVIEW_CONTAINER_ID}" style="font-family: {}; font-size: {}px">{body}</div>"#,
        escape_html(&family),
        options.font_size_pt,
    )
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

fn minimal(doc: &ResumeDocument) -> String {
    let info = &doc.personal_info;
    let h2 = "text-lg font-bold mb-2 pb-1 border-b border-gray-200";
    let mut out = String::from(r#"<div class="w-full p-8 bg-white text-gray-800">"#);

    out.push_str(r#"<header class="mb-6">"#);
    let _ = write!(out, r#"<h1 class="mb-1">{}</h1>"#, escape_html(&info.full_name()));
    out.push_str(&contact_row(&info.contact_lines(), "text-gray-600"));
    out.push_str("</header>");

    out.push_str(&summary_section(info.summary.as_deref(), "Summary", h2));
    out.push_str(&experience_section(&doc.experiences, h2));
    out.push_str(&education_section(&doc.education, h2));
    out.push_str(&skill_chips_section(&doc.skills, h2));
    out.push_str(&languages_section(&doc.languages, h2));
    out.push_str(&achievements_section(&doc.achievements, h2));
    out.push_str(&certificates_section(&doc.certificates, h2));
    out.push_str(&hobbies_section(&doc.hobbies, h2));
    out.push_str("</div>");
    out
}

fn modern(doc: &ResumeDocument) -> String {
    let info = &doc.personal_info;
    let side_h2 = "text-sm font-bold uppercase mb-3 text-primary";
    let main_h2 = "text-lg font-bold uppercase mb-3 text-gray-700";
    let mut out = String::from(r#"<div class="flex w-full bg-white">"#);

    // Sidebar
    out.push_str(r#"<div class="w-1/3 bg-gray-100 p-6 text-gray-800">"#);
    out.push_str(r#"<div class="mb-8">"#);
    let _ = write!(
        out,
        r#"<p class="text-2xl font-bold text-white bg-primary p-4 mb-4 text-center">{}</p>"#,
        escape_html(&info.initials())
    );
    let _ = write!(
        out,
        r#"<h1 class="text-center mb-1">{}</h1>"#,
        escape_html(&info.full_name())
    );
    out.push_str("</div>");

    out.push_str(r#"<section class="mb-6">"#);
    let _ = write!(out, r#"<h2 class="{side_h2}">Contact</h2>"#);
    for line in info.contact_lines() {
        let _ = write!(out, r#"<p class="text-sm mb-2">{}</p>"#, escape_html(line));
    }
    out.push_str("</section>");

    out.push_str(&skill_bars_section(&doc.skills, side_h2));
    out.push_str(&languages_section(&doc.languages, side_h2));
    out.push_str(&hobbies_section(&doc.hobbies, side_h2));
    out.push_str("</div>");

    // Main column
    out.push_str(r#"<div class="w-2/3 p-6 text-gray-800">"#);
    out.push_str(&summary_section(info.summary.as_deref(), "Profile", main_h2));
    out.push_str(&experience_section(&doc.experiences, main_h2));
    out.push_str(&education_section(&doc.education, main_h2));
    out.push_str(&achievements_section(&doc.achievements, main_h2));
    out.push_str(&certificates_section(&doc.certificates, main_h2));
    out.push_str("</div>");

    out.push_str("</div>");
    out
}

fn professional(doc: &ResumeDocument) -> String {
    let info = &doc.personal_info;
    let h2 = "text-lg font-bold mb-3 text-primary";
    let mut out = String::from(r#"<div class="w-full bg-white text-gray-800">"#);

    out.push_str(r#"<header class="bg-primary text-white p-8">"#);
    let _ = write!(
        out,
        r#"<h1 class="text-center mb-1">{}</h1>"#,
        escape_html(&info.full_name())
    );
    out.push_str(&contact_row(&info.contact_lines(), "justify-center mt-2"));
    out.push_str("</header>");

    out.push_str(r#"<div class="p-8">"#);
    out.push_str(&summary_section(info.summary.as_deref(), "Professional Summary", h2));
    out.push_str(r#"<div class="flex gap-8">"#);

    out.push_str(r#"<div class="w-2/3">"#);
    out.push_str(&experience_section(&doc.experiences, h2));
    out.push_str(&education_section(&doc.education, h2));
    out.push_str(&achievements_section(&doc.achievements, h2));
    out.push_str("</div>");

    out.push_str(r#"<div class="w-1/3">"#);
    out.push_str(&skill_chips_section(&doc.skills, h2));
    out.push_str(&languages_section(&doc.languages, h2));
    out.push_str(&certificates_section(&doc.certificates, h2));
    out.push_str(&hobbies_section(&doc.hobbies, h2));
    out.push_str("</div>");

    out.push_str("</div></div></div>");
    out
}

// ---------------------------------------------------------------------------
// Sections shared by the layouts
// ---------------------------------------------------------------------------

fn contact_row(lines: &[&str], extra: &str) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = format!(r#"<div class="flex flex-wrap text-sm gap-x-4 gap-y-1 {extra}">"#);
    for line in lines {
        let _ = write!(out, "<span>{}</span>", escape_html(line));
    }
    out.push_str("</div>");
    out
}

fn open_section(out: &mut String, title: &str, heading_class: &str) {
    let _ = write!(out, r#"<section class="mb-6"><h2 class="{heading_class}">{title}</h2>"#);
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn summary_section(summary: Option<&str>, title: &str, heading_class: &str) -> String {
    let Some(summary) = non_blank(summary) else {
        return String::new();
    };
    let mut out = String::new();
    open_section(&mut out, title, heading_class);
    for para in summary.lines().filter(|l| !l.trim().is_empty()) {
        let _ = write!(out, r#"<p class="text-sm text-gray-700">{}</p>"#, escape_html(para));
    }
    out.push_str("</section>");
    out
}

/// Title on the left, dates on the right.
fn entry_header(out: &mut String, title: &str, dates: &str) {
    let _ = write!(
        out,
        r#"<div class="flex justify-between items-baseline mb-1"><h3>{}</h3><span class="text-xs text-gray-600">{}</span></div>"#,
        escape_html(title),
        escape_html(dates)
    );
}

fn description(out: &mut String, text: Option<&str>) {
    if let Some(text) = non_blank(text) {
        for para in text.lines().filter(|l| !l.trim().is_empty()) {
            let _ = write!(out, r#"<p class="text-sm text-gray-700">{}</p>"#, escape_html(para));
        }
    }
}

fn experience_section(entries: &[Experience], heading_class: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Experience", heading_class);
    for exp in entries {
        out.push_str(r#"<div class="mb-4 pl-4 border-l-2 border-gray-200">"#);
        entry_header(&mut out, &exp.position, &exp.date_range());
        let _ = write!(out, r#"<p class="text-gray-600 mb-1">{}</p>"#, escape_html(&exp.company));
        description(&mut out, exp.description.as_deref());
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}

fn education_section(entries: &[Education], heading_class: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Education", heading_class);
    for edu in entries {
        out.push_str(r#"<div class="mb-4 pl-4 border-l-2 border-gray-200">"#);
        entry_header(&mut out, &edu.degree, &edu.date_range());
        let _ = write!(
            out,
            r#"<p class="text-gray-600 mb-1">{}</p>"#,
            escape_html(&edu.institution_line())
        );
        description(&mut out, edu.description.as_deref());
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}

fn skill_chips_section(skills: &[Skill], heading_class: &str) -> String {
    if skills.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Skills", heading_class);
    out.push_str(r#"<div class="flex flex-wrap gap-2 text-sm">"#);
    for skill in skills {
        let _ = write!(
            out,
            r#"<span class="px-2 py-1 bg-gray-100">{}</span>"#,
            escape_html(&skill.name)
        );
    }
    out.push_str("</div></section>");
    out
}

/// Skill names with a level bar filled to `level / 5`.
fn skill_bars_section(skills: &[Skill], heading_class: &str) -> String {
    if skills.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Skills", heading_class);
    for skill in skills {
        out.push_str(r#"<div class="text-sm mb-2">"#);
        out.push_str(r#"<div class="flex justify-between mb-1">"#);
        let _ = write!(out, "<span>{}</span>", escape_html(&skill.name));
        if let Some(level) = skill.level {
            let _ = write!(
                out,
                r#"<span class="text-xs text-gray-600">{level}/{MAX_SKILL_LEVEL}</span>"#
            );
        }
        out.push_str("</div>");
        if let Some(level) = skill.level {
            let pct = u32::from(level.min(MAX_SKILL_LEVEL)) * 100 / u32::from(MAX_SKILL_LEVEL);
            let _ = write!(
                out,
                r#"<div class="w-full bg-gray-200 h-1.5"><div class="bg-primary h-1.5" style="width: {pct}%"></div></div>"#
            );
        }
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}

fn languages_section(languages: &[Language], heading_class: &str) -> String {
    if languages.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Languages", heading_class);
    for lang in languages {
        let _ = write!(
            out,
            r#"<div class="flex justify-between text-sm mb-1"><span>{}</span><span class="text-gray-600">{}</span></div>"#,
            escape_html(&lang.name),
            lang.proficiency.label()
        );
    }
    out.push_str("</section>");
    out
}

fn hobbies_section(hobbies: &[Hobby], heading_class: &str) -> String {
    if hobbies.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Hobbies", heading_class);
    out.push_str(r#"<ul class="text-sm">"#);
    for hobby in hobbies {
        match non_blank(hobby.description.as_deref()) {
            Some(desc) => {
                let _ = write!(
                    out,
                    r#"<li><span class="font-bold">{}</span>: {}</li>"#,
                    escape_html(&hobby.name),
                    escape_html(desc)
                );
            }
            None => {
                let _ = write!(out, "<li>{}</li>", escape_html(&hobby.name));
            }
        }
    }
    out.push_str("</ul></section>");
    out
}

fn achievements_section(achievements: &[Achievement], heading_class: &str) -> String {
    if achievements.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Achievements", heading_class);
    for item in achievements {
        out.push_str(r#"<div class="mb-3">"#);
        entry_header(&mut out, &item.title, item.date.as_deref().unwrap_or_default());
        description(&mut out, item.description.as_deref());
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}

fn certificates_section(certificates: &[Certificate], heading_class: &str) -> String {
    if certificates.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    open_section(&mut out, "Certificates", heading_class);
    for cert in certificates {
        out.push_str(r#"<div class="mb-3">"#);
        entry_header(&mut out, &cert.name, cert.date.as_deref().unwrap_or_default());
        let _ = write!(out, r#"<p class="text-sm text-gray-600">{}</p>"#, escape_html(&cert.issuer));
        if let Some(id) = non_blank(cert.credential_id.as_deref()) {
            let _ = write!(out, r#"<p class="text-xs text-gray-500">Credential ID: {}</p>"#, escape_html(id));
        }
        if let Some(url) = non_blank(cert.credential_url.as_deref()) {
            let _ = write!(out, r#"<p class="text-xs text-gray-500">{}</p>"#, escape_html(url));
        }
        description(&mut out, cert.description.as_deref());
        out.push_str("</div>");
    }
    out.push_str("</section>");
    out
}
