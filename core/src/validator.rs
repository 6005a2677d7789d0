//! Declarative field validation for contact-form submissions.
//!
//! The rules live in a single ordered table of [`FieldSpec`]s, one per
//! submission field, evaluated uniformly by [`check`]. Every field is
//! evaluated even when earlier fields have already failed; a length
//! violation suppresses that field's pattern rule (length wins).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::submission::Submission;

/// Field name → human-readable error message. Empty ⇔ submission accepted.
pub type ValidationResult = BTreeMap<&'static str, String>;

// Character classes for the field patterns. All of them are anchored and
// Unicode-letter-aware (`\p{L}`), so they match the full value or nothing.
const NAME_PATTERN: &str = r"^\p{L}{2,}(?:\x20\p{L}{2,}){1,5}$";
const SENTENCE_PATTERN: &str = r"^[\p{L}\d\x20-\x2F\x3A-\x40\x5B-\x60\x7B-\x7E\x{00B4}]*$";
const MESSAGE_PATTERN: &str = r"^[\p{L}\d\x20-\x2F\x3A-\x40\x5B-\x60\x7B-\x7E\x{00B4}\s]+$";
// Simplified email shape, deliberately not RFC-complete.
const EMAIL_PATTERN: &str =
    r"^[a-z\x2E\x5F]+\x2B?[a-z]*[^\x2B]\x40(?:[a-z]+[a-z\x2D\x2E]?)+[^\x2D]\x2E[a-z]{2,5}$";

/// Inclusive length bounds, counted in Unicode scalar values.
struct LengthRule {
    min: usize,
    max: usize,
}

/// Full-string pattern plus the message recorded when it does not match.
struct PatternRule {
    regex: Regex,
    error: String,
}

/// Declarative constraints for one submission field.
struct FieldSpec {
    name: &'static str,
    display_name: &'static str,
    length: LengthRule,
    pattern: Option<PatternRule>,
    value: fn(&Submission) -> &str,
}

#[allow(clippy::expect_used)]
fn sentence_rule(display_name: &str, pattern: &str) -> PatternRule {
    PatternRule {
        regex: Regex::new(pattern).expect("valid field pattern"),
        error: format!("{display_name} must only contain language letters and ascii symbols"),
    }
}

/// The six field rules, in wire order. Built once, never mutated.
#[allow(clippy::expect_used)]
static RULES: LazyLock<[FieldSpec; 6]> = LazyLock::new(|| {
    [
        FieldSpec {
            name: "subject",
            display_name: "Subject",
            length: LengthRule { min: 12, max: 128 },
            pattern: Some(sentence_rule("Subject", SENTENCE_PATTERN)),
            value: |s| &s.subject,
        },
        FieldSpec {
            name: "fullname",
            display_name: "Full name",
            length: LengthRule { min: 5, max: 48 },
            pattern: Some(PatternRule {
                regex: Regex::new(NAME_PATTERN).expect("valid field pattern"),
                error: "Full name has to have at least one middle or last name".to_string(),
            }),
            value: |s| &s.fullname,
        },
        FieldSpec {
            name: "email",
            display_name: "Email",
            length: LengthRule { min: 12, max: 128 },
            pattern: Some(PatternRule {
                regex: Regex::new(EMAIL_PATTERN).expect("valid field pattern"),
                error: "Email must be a valid email address".to_string(),
            }),
            value: |s| &s.email,
        },
        FieldSpec {
            name: "business",
            display_name: "Business",
            length: LengthRule { min: 3, max: 32 },
            pattern: Some(sentence_rule("Business", SENTENCE_PATTERN)),
            value: |s| &s.business,
        },
        FieldSpec {
            name: "body",
            display_name: "Message",
            length: LengthRule {
                min: 64,
                max: 4096,
            },
            pattern: Some(sentence_rule("Message", MESSAGE_PATTERN)),
            value: |s| &s.body,
        },
        FieldSpec {
            name: "details",
            display_name: "Additional details",
            length: LengthRule {
                min: 4,
                max: 1024,
            },
            pattern: Some(sentence_rule("Additional details", MESSAGE_PATTERN)),
            value: |s| &s.details,
        },
    ]
});

/// Evaluate every field rule against `submission`.
///
/// No early exit: all six fields are checked independently. Each field
/// contributes at most one error; when the length bound fails, the pattern
/// is not evaluated for that field.
pub fn check(submission: &Submission) -> ValidationResult {
    let mut errors = ValidationResult::new();

    for spec in RULES.iter() {
        let value = (spec.value)(submission);
        let length = value.chars().count();

        if length < spec.length.min || length > spec.length.max {
            errors.insert(
                spec.name,
                format!(
                    "{} length mustn't be shorter than {} characters or longer than {} characters",
                    spec.display_name, spec.length.min, spec.length.max
                ),
            );
        } else if let Some(pattern) = &spec.pattern
            && !pattern.regex.is_match(value)
        {
            errors.insert(spec.name, pattern.error.clone());
        }
    }

    errors
}
