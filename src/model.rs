//! Resume data model.
//!
//! The JSON shape (camelCase field names, enum spellings) matches what the
//! builder UI persists, so a stored draft can be fed straight back through
//! [`crate::validation::validate`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a list entry. Assigned once at creation and used to
/// reconcile list items across edits; carries no business meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub hobbies: Vec<Hobby>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub template: TemplateSelection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .collect()
    }

    /// Contact lines in display order, skipping blanks.
    pub fn contact_lines(&self) -> Vec<&str> {
        [
            Some(self.email.as_str()),
            Some(self.phone.as_str()),
            self.location.as_deref(),
            self.website.as_deref(),
            self.linkedin.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Dated entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: EntryId,
    pub company: String,
    pub position: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Experience {
    pub fn new(company: &str, position: &str, start_date: &str) -> Self {
        Self {
            id: EntryId::generate(),
            company: company.to_string(),
            position: position.to_string(),
            start_date: start_date.to_string(),
            end_date: None,
            current: false,
            description: None,
        }
    }

    pub fn date_range(&self) -> String {
        format_date_range(&self.start_date, self.end_date.as_deref(), self.current)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: EntryId,
    pub institution: String,
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Education {
    pub fn new(institution: &str, degree: &str, start_date: &str) -> Self {
        Self {
            id: EntryId::generate(),
            institution: institution.to_string(),
            degree: degree.to_string(),
            field: None,
            start_date: start_date.to_string(),
            end_date: None,
            current: false,
            description: None,
        }
    }

    pub fn date_range(&self) -> String {
        format_date_range(&self.start_date, self.end_date.as_deref(), self.current)
    }

    /// `institution, field` or just the institution.
    pub fn institution_line(&self) -> String {
        match self.field.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(field) => format!("{}, {}", self.institution, field),
            None => self.institution.clone(),
        }
    }
}

/// Label printed for an ongoing entry.
pub const PRESENT_LABEL: &str = "Present";

/// A `current` entry never shows its stored end date.
pub fn format_date_range(start: &str, end: Option<&str>, current: bool) -> String {
    if current {
        return format!("{start} - {PRESENT_LABEL}");
    }
    match end.map(str::trim).filter(|e| !e.is_empty()) {
        Some(end) => format!("{start} - {end}"),
        None => start.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Skills and the optional sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: EntryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SkillCategory>,
}

impl Skill {
    pub fn new(name: &str, level: Option<u8>) -> Self {
        Self {
            id: EntryId::generate(),
            name: name.to_string(),
            level,
            category: None,
        }
    }
}

/// Highest skill level on the 1–5 scale.
pub const MAX_SKILL_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    Technical,
    #[serde(rename = "Soft Skills")]
    SoftSkills,
    #[serde(rename = "Industry Knowledge")]
    IndustryKnowledge,
    Tools,
    Certifications,
    Other,
}

impl SkillCategory {
    pub const NAMES: &'static [&'static str] = &[
        "Technical",
        "Soft Skills",
        "Industry Knowledge",
        "Tools",
        "Certifications",
        "Other",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: EntryId,
    pub name: String,
    pub proficiency: LanguageProficiency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageProficiency {
    Basic,
    Intermediate,
    Advanced,
    Native,
}

impl LanguageProficiency {
    pub const NAMES: &'static [&'static str] = &["Basic", "Intermediate", "Advanced", "Native"];

    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Native => "Native",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hobby {
    pub id: EntryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: EntryId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: EntryId,
    pub name: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "credentialID", default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(rename = "credentialURL", default, skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Template selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateSelection {
    /// Only narrows which templates are offered; never changes the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<TemplateRole>,
    #[serde(default)]
    pub style: TemplateStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    #[default]
    Minimal,
    Professional,
    Modern,
    Academic,
    Creative,
    Executive,
    Technical,
    Elegant,
    Bold,
    Simple,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 10] = [
        Self::Minimal,
        Self::Professional,
        Self::Modern,
        Self::Academic,
        Self::Creative,
        Self::Executive,
        Self::Technical,
        Self::Elegant,
        Self::Bold,
        Self::Simple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Professional => "professional",
            Self::Modern => "modern",
            Self::Academic => "academic",
            Self::Creative => "creative",
            Self::Executive => "executive",
            Self::Technical => "technical",
            Self::Elegant => "elegant",
            Self::Bold => "bold",
            Self::Simple => "simple",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateRole {
    SoftwareEngineer,
    Doctor,
    Student,
    MbaStudent,
    BusinessAnalyst,
    ProjectManager,
    MarketingProfessional,
    Designer,
    Researcher,
    Teacher,
    DataScientist,
    FinanceProfessional,
    HealthcareWorker,
    SalesRepresentative,
    CustomerService,
    Executive,
}

impl TemplateRole {
    pub const NAMES: &'static [&'static str] = &[
        "software-engineer",
        "doctor",
        "student",
        "mba-student",
        "business-analyst",
        "project-manager",
        "marketing-professional",
        "designer",
        "researcher",
        "teacher",
        "data-scientist",
        "finance-professional",
        "healthcare-worker",
        "sales-representative",
        "customer-service",
        "executive",
    ];
}

// ---------------------------------------------------------------------------
// Editing helpers
// ---------------------------------------------------------------------------

impl ResumeDocument {
    /// A fresh draft: blank personal info, no entries, minimal template.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_experience(&mut self, entry: Experience) -> EntryId {
        let id = entry.id.clone();
        self.experiences.push(entry);
        id
    }

    pub fn add_education(&mut self, entry: Education) -> EntryId {
        let id = entry.id.clone();
        self.education.push(entry);
        id
    }

    pub fn add_skill(&mut self, entry: Skill) -> EntryId {
        let id = entry.id.clone();
        self.skills.push(entry);
        id
    }

    /// Remove the entry with `id` from whichever list holds it.
    /// Returns `false` when no entry matched.
    pub fn remove_entry(&mut self, id: &EntryId) -> bool {
        let before = self.entry_count();
        self.experiences.retain(|e| &e.id != id);
        self.education.retain(|e| &e.id != id);
        self.skills.retain(|e| &e.id != id);
        self.languages.retain(|e| &e.id != id);
        self.hobbies.retain(|e| &e.id != id);
        self.achievements.retain(|e| &e.id != id);
        self.certificates.retain(|e| &e.id != id);
        self.entry_count() != before
    }

    fn entry_count(&self) -> usize {
        self.experiences.len()
            + self.education.len()
            + self.skills.len()
            + self.languages.len()
            + self.hobbies.len()
            + self.achievements.len()
            + self.certificates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_entry_hides_end_date() {
        assert_eq!(format_date_range("01/2020", Some("05/2022"), true), "01/2020 - Present");
        assert_eq!(format_date_range("01/2020", Some("05/2022"), false), "01/2020 - 05/2022");
        assert_eq!(format_date_range("01/2020", None, false), "01/2020");
        assert_eq!(format_date_range("01/2020", Some("  "), false), "01/2020");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Experience::new("Acme", "Engineer", "2020");
        let b = Experience::new("Acme", "Engineer", "2020");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn remove_entry_reports_match() {
        let mut doc = ResumeDocument::empty();
        let id = doc.add_skill(Skill::new("Rust", Some(4)));
        doc.add_experience(Experience::new("Acme", "Engineer", "2020"));
        assert!(doc.remove_entry(&id));
        assert!(doc.skills.is_empty());
        assert_eq!(doc.experiences.len(), 1);
        assert!(!doc.remove_entry(&id));
    }

    #[test]
    fn template_style_names_round_trip() {
        for style in TemplateStyle::ALL {
            assert_eq!(TemplateStyle::from_name(style.name()), Some(style));
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.name()));
        }
        assert_eq!(TemplateStyle::from_name("nonexistent"), None);
    }

    #[test]
    fn role_serializes_kebab_case() {
        let json = serde_json::to_string(&TemplateRole::MbaStudent).unwrap();
        assert_eq!(json, "\"mba-student\"");
        for name in TemplateRole::NAMES {
            let parsed: TemplateRole = serde_json::from_str(&format!("\"{name}\"")).unwrap();
            assert_eq!(serde_json::to_string(&parsed).unwrap(), format!("\"{name}\""));
        }
    }

    #[test]
    fn initials_and_contacts() {
        let info = PersonalInfo {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            phone: "5551234567".into(),
            website: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(info.initials(), "JD");
        assert_eq!(info.full_name(), "Jane Doe");
        assert_eq!(info.contact_lines(), vec!["jane@x.com", "5551234567"]);
    }
}
