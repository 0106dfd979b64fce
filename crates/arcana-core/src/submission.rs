//! Captured form submissions and the single point where the upstream parser's
//! "value may be a list or a scalar" ambiguity is resolved.
//!
//! Every component downstream of [`Submission::field`] assumes normalized
//! scalars only; no other module may branch on the list/scalar shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A submitted form value: either a plain string or a one-element list,
/// depending on how the upstream form parser captured it. Never richer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Many(Vec<String>),
}

/// The raw captured form: field name -> string-or-list. Immutable after capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(flatten)]
    pub fields: HashMap<String, FieldValue>,
}

impl Submission {
    /// Normalized scalar for `key`: absent => `""`; one-element list => its sole
    /// element; plain string => trimmed. Never fails.
    pub fn field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None => String::new(),
            Some(FieldValue::Single(s)) => s.trim().to_string(),
            Some(FieldValue::Many(list)) => {
                list.first().map(|s| s.trim().to_string()).unwrap_or_default()
            }
        }
    }

    /// First non-empty normalized value among `keys` (field-name aliases like
    /// `birthCity` / `birthPlace`).
    pub fn field_any(&self, keys: &[&str]) -> String {
        keys.iter().map(|k| self.field(k)).find(|v| !v.is_empty()).unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.fields.insert(key.to_string(), FieldValue::Single(value.to_string()));
    }

    /// Subject of the report, projected from the captured fields.
    pub fn person(&self) -> Person {
        Person {
            full_name: self.field("fullName"),
            email: self.field("email"),
            date_of_birth: self.field("birthDate"),
            time_of_birth: self.field("birthTime"),
            birth_place: self.field_any(&["birthCity", "birthPlace"]),
        }
    }

    /// Reference to an uploaded palm image, if the form carried one.
    pub fn palm_image(&self) -> Option<String> {
        let img = self.field_any(&["palmImage", "image"]);
        if img.is_empty() {
            None
        } else {
            Some(img)
        }
    }
}

/// Pure projection of a Submission; no independent lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    pub full_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub birth_place: String,
}

impl Person {
    /// Display name with an em-dash placeholder when the form left it blank.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            "—"
        } else {
            &self.full_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission_from_json(json: &str) -> Submission {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_field_coalesces_list_and_scalar() {
        let sub = submission_from_json(r#"{"email": ["a@b.com"], "q": "  hi  "}"#);
        assert_eq!(sub.field("email"), "a@b.com");
        assert_eq!(sub.field("q"), "hi");
        assert_eq!(sub.field("missing"), "");
    }

    #[test]
    fn test_field_empty_list_is_empty_string() {
        let sub = submission_from_json(r#"{"email": []}"#);
        assert_eq!(sub.field("email"), "");
    }

    #[test]
    fn test_person_projection_uses_place_alias() {
        let sub = submission_from_json(
            r#"{"fullName": "Jane Doe", "email": "x@y.com", "birthDate": "1990-05-14", "birthPlace": "Lisbon"}"#,
        );
        let person = sub.person();
        assert_eq!(person.full_name, "Jane Doe");
        assert_eq!(person.birth_place, "Lisbon");
        assert_eq!(person.time_of_birth, "");
    }

    #[test]
    fn test_palm_image_absent() {
        let sub = submission_from_json(r#"{"email": "x@y.com"}"#);
        assert!(sub.palm_image().is_none());
    }
}
