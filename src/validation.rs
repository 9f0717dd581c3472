//! Schema validation for untrusted resume input (form state, uploads,
//! persisted drafts).
//!
//! Validation walks the raw JSON value and records every violation it meets
//! instead of stopping at the first, so a form can highlight all problem
//! fields at once. Only a candidate with zero violations is converted into
//! a typed [`ResumeDocument`].

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{FieldViolation, ValidationError};
use crate::model::{
    LanguageProficiency, ResumeDocument, SkillCategory, TemplateRole, TemplateStyle,
    MAX_SKILL_LEVEL,
};

/// Minimum length of a phone number, in characters.
pub const MIN_PHONE_LEN: usize = 7;

/// Validate a JSON candidate and build the typed document.
pub fn validate(candidate: &Value) -> Result<ResumeDocument, ValidationError> {
    let mut cx = ValidationContext::default();
    match candidate.as_object() {
        Some(root) => check_resume(&mut cx, root),
        None => cx.add_error("Expected an object"),
    }
    cx.finish()?;

    serde_json::from_value(candidate.clone()).map_err(|e| ValidationError {
        violations: vec![FieldViolation::new("$", e.to_string())],
    })
}

/// Parse `text` as JSON and validate it. Malformed JSON is reported as a
/// single violation at `$`.
pub fn validate_json(text: &str) -> Result<ResumeDocument, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ValidationError {
        violations: vec![FieldViolation::new("$", format!("Invalid JSON: {e}"))],
    })?;
    validate(&value)
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Tracks the current instance path and the violations collected so far.
#[derive(Default)]
struct ValidationContext {
    path: Vec<Segment>,
    violations: Vec<FieldViolation>,
}

impl ValidationContext {
    fn add_error(&mut self, message: impl Into<String>) {
        let path = self.current_path();
        self.violations.push(FieldViolation::new(path, message));
    }

    fn current_path(&self) -> String {
        if self.path.is_empty() {
            return "$".to_string();
        }
        let mut out = String::new();
        for seg in &self.path {
            match seg {
                Segment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }

    fn with_key<R>(&mut self, key: &'static str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Key(key));
        let result = f(self);
        self.path.pop();
        result
    }

    fn with_index<R>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Index(index));
        let result = f(self);
        self.path.pop();
        result
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Required string of at least `min_len` characters, whitespace included.
/// `message` is reported both when the field is missing and when it is too short.
fn required_string<'a>(
    cx: &mut ValidationContext,
    obj: &'a Map<String, Value>,
    key: &'static str,
    min_len: usize,
    message: &str,
) -> Option<&'a str> {
    cx.with_key(key, |cx| match present(obj, key) {
        None => {
            cx.add_error(message);
            None
        }
        Some(Value::String(s)) => {
            if s.chars().count() < min_len {
                cx.add_error(message);
            }
            Some(s.as_str())
        }
        Some(_) => {
            cx.add_error("Expected a string");
            None
        }
    })
}

fn optional_string<'a>(
    cx: &mut ValidationContext,
    obj: &'a Map<String, Value>,
    key: &'static str,
) -> Option<&'a str> {
    cx.with_key(key, |cx| match present(obj, key) {
        None => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            cx.add_error("Expected a string");
            None
        }
    })
}

/// Optional URL; the empty string is accepted as "no URL".
fn optional_url(cx: &mut ValidationContext, obj: &Map<String, Value>, key: &'static str) {
    if let Some(s) = optional_string(cx, obj, key) {
        if !s.is_empty() && !is_valid_url(s) {
            cx.with_key(key, |cx| cx.add_error("Invalid URL"));
        }
    }
}

fn optional_bool(cx: &mut ValidationContext, obj: &Map<String, Value>, key: &'static str) {
    cx.with_key(key, |cx| {
        if let Some(v) = obj.get(key) {
            if !v.is_boolean() {
                cx.add_error("Expected a boolean");
            }
        }
    });
}

/// How an enumerated field may be left out.
#[derive(Clone, Copy)]
enum Presence {
    Required,
    /// Absent or `null` both mean "none".
    Nullable,
    /// Absent takes the default; `null` is not a member.
    Defaulted,
}

fn enum_member(
    cx: &mut ValidationContext,
    obj: &Map<String, Value>,
    key: &'static str,
    allowed: &[&str],
    presence: Presence,
) {
    cx.with_key(key, |cx| match (obj.get(key), presence) {
        (Some(Value::String(s)), _) if allowed.contains(&s.as_str()) => {}
        (None | Some(Value::Null), Presence::Required) => {
            cx.add_error(format!("Required; expected one of {}", allowed.join(", ")))
        }
        (None, _) | (Some(Value::Null), Presence::Nullable) => {}
        (Some(other), _) => cx.add_error(format!(
            "Invalid value {other}; expected one of {}",
            allowed.join(", ")
        )),
    });
}

/// Walk an optional array field, giving each element object to `check`.
/// Also enforces that `id` is unique across the list. An explicit `null`
/// is not an empty list.
fn entry_list(
    cx: &mut ValidationContext,
    obj: &Map<String, Value>,
    key: &'static str,
    check: impl Fn(&mut ValidationContext, &Map<String, Value>),
) {
    cx.with_key(key, |cx| {
        let items = match obj.get(key) {
            None => return,
            Some(Value::Array(items)) => items,
            Some(_) => {
                cx.add_error("Expected an array");
                return;
            }
        };
        let mut seen_ids = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            cx.with_index(i, |cx| match item.as_object() {
                Some(entry) => {
                    if let Some(id) = required_string(cx, entry, "id", 1, "Identifier is required") {
                        if !id.trim().is_empty() && !seen_ids.insert(id.to_string()) {
                            cx.with_key("id", |cx| cx.add_error(format!("Duplicate identifier `{id}`")));
                        }
                    }
                    check(cx, entry);
                }
                None => cx.add_error("Expected an object"),
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Entity rules
// ---------------------------------------------------------------------------

fn check_resume(cx: &mut ValidationContext, root: &Map<String, Value>) {
    cx.with_key("personalInfo", |cx| match present(root, "personalInfo") {
        Some(Value::Object(info)) => check_personal_info(cx, info),
        Some(_) => cx.add_error("Expected an object"),
        None => cx.add_error("Personal information is required"),
    });

    entry_list(cx, root, "experiences", check_experience);
    entry_list(cx, root, "education", check_education);
    entry_list(cx, root, "skills", check_skill);
    entry_list(cx, root, "languages", |cx, e| {
        required_string(cx, e, "name", 1, "Language name is required");
        enum_member(cx, e, "proficiency", LanguageProficiency::NAMES, Presence::Required);
    });
    entry_list(cx, root, "hobbies", |cx, e| {
        required_string(cx, e, "name", 1, "Hobby name is required");
        optional_string(cx, e, "description");
    });
    entry_list(cx, root, "achievements", |cx, e| {
        required_string(cx, e, "title", 1, "Achievement title is required");
        optional_string(cx, e, "date");
        optional_string(cx, e, "description");
    });
    entry_list(cx, root, "certificates", check_certificate);

    cx.with_key("template", |cx| match root.get("template") {
        None => {}
        Some(Value::Object(t)) => {
            let styles: Vec<&str> = TemplateStyle::ALL.iter().map(|s| s.name()).collect();
            enum_member(cx, t, "style", &styles, Presence::Defaulted);
            enum_member(cx, t, "role", TemplateRole::NAMES, Presence::Nullable);
        }
        Some(_) => cx.add_error("Expected an object"),
    });
}

fn check_personal_info(cx: &mut ValidationContext, info: &Map<String, Value>) {
    required_string(cx, info, "firstName", 1, "First name is required");
    required_string(cx, info, "lastName", 1, "Last name is required");
    cx.with_key("email", |cx| match present(info, "email") {
        Some(Value::String(s)) if is_valid_email(s) => {}
        Some(Value::String(_)) | None => cx.add_error("Invalid email address"),
        Some(_) => cx.add_error("Expected a string"),
    });
    required_string(cx, info, "phone", MIN_PHONE_LEN, "Phone number is required");
    optional_string(cx, info, "location");
    optional_url(cx, info, "website");
    optional_string(cx, info, "linkedin");
    optional_string(cx, info, "summary");
}

fn check_experience(cx: &mut ValidationContext, e: &Map<String, Value>) {
    required_string(cx, e, "company", 1, "Company name is required");
    required_string(cx, e, "position", 1, "Position is required");
    check_date_range(cx, e);
}

fn check_education(cx: &mut ValidationContext, e: &Map<String, Value>) {
    required_string(cx, e, "institution", 1, "Institution name is required");
    required_string(cx, e, "degree", 1, "Degree is required");
    optional_string(cx, e, "field");
    check_date_range(cx, e);
}

fn check_date_range(cx: &mut ValidationContext, e: &Map<String, Value>) {
    required_string(cx, e, "startDate", 1, "Start date is required");
    optional_string(cx, e, "endDate");
    optional_bool(cx, e, "current");
    optional_string(cx, e, "description");
}

fn check_skill(cx: &mut ValidationContext, e: &Map<String, Value>) {
    required_string(cx, e, "name", 1, "Skill name is required");
    cx.with_key("level", |cx| match present(e, "level") {
        None => {}
        Some(v) => match v.as_u64() {
            Some(level) if (1..=MAX_SKILL_LEVEL as u64).contains(&level) => {}
            Some(_) => cx.add_error(format!("Level must be between 1 and {MAX_SKILL_LEVEL}")),
            None => cx.add_error(format!("Level must be an integer between 1 and {MAX_SKILL_LEVEL}")),
        },
    });
    enum_member(cx, e, "category", SkillCategory::NAMES, Presence::Nullable);
}

fn check_certificate(cx: &mut ValidationContext, e: &Map<String, Value>) {
    required_string(cx, e, "name", 1, "Certificate name is required");
    required_string(cx, e, "issuer", 1, "Issuer is required");
    optional_string(cx, e, "date");
    optional_string(cx, e, "credentialID");
    optional_url(cx, e, "credentialURL");
    optional_string(cx, e, "description");
}

// ---------------------------------------------------------------------------
// Format checks
// ---------------------------------------------------------------------------

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

pub fn is_valid_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && email_regex().is_match(s)
}

pub fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_candidate() -> Value {
        json!({
            "personalInfo": {
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@x.com",
                "phone": "5551234567"
            },
            "experiences": [{
                "id": "exp-1",
                "company": "Acme",
                "position": "Engineer",
                "startDate": "01/2020",
                "current": true
            }],
            "education": [],
            "skills": [],
            "template": { "style": "modern" }
        })
    }

    #[test]
    fn accepts_valid_document() {
        let doc = validate(&valid_candidate()).unwrap();
        assert_eq!(doc.personal_info.first_name, "Jane");
        assert_eq!(doc.experiences.len(), 1);
        assert!(doc.experiences[0].current);
        assert_eq!(doc.template.style, TemplateStyle::Modern);
    }

    #[test]
    fn missing_email_is_reported_on_email_field() {
        let mut c = valid_candidate();
        c["personalInfo"].as_object_mut().unwrap().remove("email");
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["personalInfo.email"]);
    }

    #[test]
    fn reports_every_violation() {
        let c = json!({
            "personalInfo": {
                "firstName": "",
                "lastName": "Doe",
                "email": "not-an-email",
                "phone": "123",
                "website": "not a url"
            },
            "experiences": [{ "id": "a", "company": "", "position": "Dev", "startDate": "" }],
            "skills": [{ "id": "s", "name": "Rust", "level": 9 }],
            "template": { "style": "fancy" }
        });
        let err = validate(&c).unwrap_err();
        for path in [
            "personalInfo.firstName",
            "personalInfo.email",
            "personalInfo.phone",
            "personalInfo.website",
            "experiences[0].company",
            "experiences[0].startDate",
            "skills[0].level",
            "template.style",
        ] {
            assert!(err.has_violation_at(path), "missing violation at {path}: {err}");
        }
        assert_eq!(err.violations.len(), 8);
    }

    #[test]
    fn defaults_applied_when_absent() {
        let c = json!({
            "personalInfo": {
                "firstName": "A", "lastName": "B", "email": "a@b.io", "phone": "1234567"
            }
        });
        let doc = validate(&c).unwrap();
        assert!(doc.experiences.is_empty());
        assert!(doc.certificates.is_empty());
        assert_eq!(doc.template.style, TemplateStyle::Minimal);
        assert_eq!(doc.template.role, None);
    }

    #[test]
    fn empty_urls_are_allowed() {
        let mut c = valid_candidate();
        c["personalInfo"]["website"] = json!("");
        c["certificates"] = json!([{ "id": "c1", "name": "CKA", "issuer": "CNCF", "credentialURL": "" }]);
        assert!(validate(&c).is_ok());
        c["certificates"][0]["credentialURL"] = json!("nope");
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["certificates[0].credentialURL"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut c = valid_candidate();
        c["skills"] = json!([
            { "id": "s1", "name": "Rust" },
            { "id": "s1", "name": "Go" }
        ]);
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["skills[1].id"]);
    }

    #[test]
    fn fractional_level_rejected() {
        let mut c = valid_candidate();
        c["skills"] = json!([{ "id": "s1", "name": "Rust", "level": 2.5 }]);
        assert!(validate(&c).unwrap_err().has_violation_at("skills[0].level"));
    }

    #[test]
    fn null_sections_are_reported_at_their_path() {
        let mut c = valid_candidate();
        c["experiences"] = Value::Null;
        c["template"] = Value::Null;
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["experiences", "template"]);
        assert_eq!(err.violations[0].message, "Expected an array");
        assert_eq!(err.violations[1].message, "Expected an object");
    }

    #[test]
    fn null_style_is_reported_but_null_role_is_none() {
        let mut c = valid_candidate();
        c["template"] = json!({ "style": null, "role": null });
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["template.style"]);

        c["template"] = json!({ "role": null });
        let doc = validate(&c).unwrap();
        assert_eq!(doc.template.role, None);
        assert_eq!(doc.template.style, TemplateStyle::Minimal);
    }

    #[test]
    fn null_proficiency_is_required() {
        let mut c = valid_candidate();
        c["languages"] = json!([{ "id": "l1", "name": "French", "proficiency": null }]);
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["languages[0].proficiency"]);
    }

    #[test]
    fn whitespace_counts_toward_length() {
        let mut c = valid_candidate();
        c["personalInfo"]["firstName"] = json!(" ");
        assert!(validate(&c).is_ok());
        c["personalInfo"]["phone"] = json!("555 12 ");
        assert!(validate(&c).is_ok());
        c["personalInfo"]["phone"] = json!("555 12");
        let err = validate(&c).unwrap_err();
        assert_eq!(err.paths(), vec!["personalInfo.phone"]);
    }

    #[test]
    fn malformed_json_reported_at_root() {
        let err = validate_json("{ nope").unwrap_err();
        assert_eq!(err.paths(), vec!["$"]);
    }

    #[test]
    fn round_trip_through_serialization() {
        let mut c = valid_candidate();
        c["languages"] = json!([{ "id": "l1", "name": "French", "proficiency": "Advanced" }]);
        c["skills"] = json!([{ "id": "s1", "name": "Rust", "level": 5, "category": "Soft Skills" }]);
        let doc = validate(&c).unwrap();
        let again = validate(&serde_json::to_value(&doc).unwrap()).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("jane@x"));
        assert!(!is_valid_email(".jane@x.com"));
        assert!(!is_valid_email("ja..ne@x.com"));
        assert!(!is_valid_email("jane.@x.com"));
    }
}
