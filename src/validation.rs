//! Field-level validation for phrase form input.
//!
//! Everything here is pure: the same input always produces the same
//! [`ValidationResult`], and nothing is written anywhere. Failures are
//! returned as data, never thrown, so the caller can render them inline.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_TEXT_LENGTH: usize = 3;
pub const MAX_TEXT_LENGTH: usize = 500;
pub const MIN_AUTHOR_LENGTH: usize = 2;
pub const MAX_AUTHOR_LENGTH: usize = 50;
pub const MIN_CATEGORY_LENGTH: usize = 2;
pub const MAX_CATEGORY_LENGTH: usize = 30;
pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_LENGTH: usize = 20;

// Free text keeps ASCII word characters, basic punctuation, and the
// accented letters the phrase form accepts. The classes are spelled out
// because `\w` would admit every Unicode letter.
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9_\s.,!?áéíóúñü()-]").expect("valid pattern"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));
static TAG_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9_\sáéíóúñü]+$").expect("valid pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    Required,
    TooShort,
    TooLong,
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
    pub code: ValidationCode,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>, code: ValidationCode) -> Self {
        Self {
            field,
            message: message.into(),
            code,
        }
    }
}

/// Outcome of validating a whole form. An empty error list means valid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Raw form values as typed by the user. Tags arrive as one
/// comma-separated string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhraseForm {
    pub text: String,
    pub tags: String,
    pub author: String,
    pub category: String,
}

struct FieldRules {
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

const TEXT_RULES: FieldRules = FieldRules {
    required: true,
    min_length: Some(MIN_TEXT_LENGTH),
    max_length: Some(MAX_TEXT_LENGTH),
};
const AUTHOR_RULES: FieldRules = FieldRules {
    required: false,
    min_length: Some(MIN_AUTHOR_LENGTH),
    max_length: Some(MAX_AUTHOR_LENGTH),
};
const CATEGORY_RULES: FieldRules = FieldRules {
    required: false,
    min_length: Some(MIN_CATEGORY_LENGTH),
    max_length: Some(MAX_CATEGORY_LENGTH),
};

/// Strip disallowed characters, trim, and collapse whitespace runs to
/// single spaces. Stripping happens first so that removing a character
/// between spaces cannot leave a double space behind; the function is
/// idempotent.
pub fn sanitize_input(input: &str) -> String {
    let stripped = DISALLOWED_CHARS.replace_all(input, "");
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
}

/// Comma-separated tag string into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn character_count(text: &str) -> usize {
    sanitize_input(text).chars().count()
}

pub fn is_valid_text_length(text: &str) -> bool {
    let count = character_count(text);
    (MIN_TEXT_LENGTH..=MAX_TEXT_LENGTH).contains(&count)
}

pub fn remaining_characters(text: &str, max_length: usize) -> usize {
    max_length.saturating_sub(character_count(text))
}

fn validate_field(field: &'static str, value: &str, rules: &FieldRules) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let trimmed = sanitize_input(value);

    if rules.required && trimmed.is_empty() {
        errors.push(ValidationError::new(
            field,
            format!("{field} is required"),
            ValidationCode::Required,
        ));
        return errors;
    }

    if !rules.required && trimmed.is_empty() {
        return errors;
    }

    let count = trimmed.chars().count();

    if let Some(min) = rules.min_length {
        if count < min {
            errors.push(ValidationError::new(
                field,
                format!("{field} must be at least {min} characters"),
                ValidationCode::TooShort,
            ));
        }
    }

    if let Some(max) = rules.max_length {
        if count > max {
            errors.push(ValidationError::new(
                field,
                format!("{field} cannot exceed {max} characters"),
                ValidationCode::TooLong,
            ));
        }
    }

    errors
}

fn validate_tags(raw: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if raw.trim().is_empty() {
        return errors;
    }

    let tags = parse_tags(raw);

    if tags.len() > MAX_TAGS {
        errors.push(ValidationError::new(
            "tags",
            format!("Maximum {MAX_TAGS} tags allowed"),
            ValidationCode::TooLong,
        ));
    }

    for tag in &tags {
        if tag.chars().count() > MAX_TAG_LENGTH {
            errors.push(ValidationError::new(
                "tags",
                format!("Tag \"{tag}\" exceeds {MAX_TAG_LENGTH} characters"),
                ValidationCode::TooLong,
            ));
            break;
        }

        if !TAG_FORMAT.is_match(tag) {
            errors.push(ValidationError::new(
                "tags",
                format!("Tag \"{tag}\" contains invalid characters"),
                ValidationCode::InvalidFormat,
            ));
            break;
        }
    }

    errors
}

/// Validate a whole phrase form. Total: any combination of string inputs
/// yields a well-formed result.
pub fn validate_phrase_form(form: &PhraseForm) -> ValidationResult {
    let mut errors = Vec::new();

    errors.extend(validate_field("text", &form.text, &TEXT_RULES));
    errors.extend(validate_field("author", &form.author, &AUTHOR_RULES));
    errors.extend(validate_field("category", &form.category, &CATEGORY_RULES));
    errors.extend(validate_tags(&form.tags));

    ValidationResult { errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &str, tags: &str, author: &str, category: &str) -> PhraseForm {
        PhraseForm {
            text: text.to_string(),
            tags: tags.to_string(),
            author: author.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn sanitize_trims_collapses_and_strips() {
        assert_eq!(sanitize_input("  hello   world  "), "hello world");
        assert_eq!(sanitize_input("keep .,!?()- these"), "keep .,!?()- these");
        assert_eq!(sanitize_input("no <script> here"), "no script here");
        assert_eq!(sanitize_input("café ñandú"), "café ñandú");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "  a @ b  ",
            "tabs\tand\nnewlines",
            "<b>bold</b>",
            "",
            "   ",
            "plain",
            "a;b;c",
        ];
        for s in samples {
            let once = sanitize_input(s);
            assert_eq!(sanitize_input(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn empty_text_is_required() {
        let result = validate_phrase_form(&form("   ", "", "", ""));
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field, "text");
        assert_eq!(result.errors[0].code, ValidationCode::Required);
    }

    #[test]
    fn short_and_long_text_are_rejected() {
        let short = validate_phrase_form(&form("ab", "", "", ""));
        assert_eq!(short.errors[0].code, ValidationCode::TooShort);

        let long = validate_phrase_form(&form(&"x".repeat(501), "", "", ""));
        assert_eq!(long.errors[0].code, ValidationCode::TooLong);
    }

    #[test]
    fn optional_fields_skip_checks_when_empty() {
        let result = validate_phrase_form(&form("valid text", "", "", ""));
        assert!(result.is_valid());
    }

    #[test]
    fn present_author_is_length_checked() {
        let result = validate_phrase_form(&form("valid text", "", "x", ""));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "author");
        assert_eq!(result.errors[0].code, ValidationCode::TooShort);
    }

    #[test]
    fn too_many_tags_use_too_long_code() {
        let result = validate_phrase_form(&form("valid text", "a,b,c,d,e,f", "", ""));
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "tags" && e.code == ValidationCode::TooLong));
    }

    #[test]
    fn oversized_tag_is_rejected() {
        let tag = "t".repeat(21);
        let result = validate_phrase_form(&form("valid text", &tag, "", ""));
        assert_eq!(result.errors[0].code, ValidationCode::TooLong);
    }

    #[test]
    fn tag_charset_is_restricted() {
        let result = validate_phrase_form(&form("valid text", "good tag, bad!tag", "", ""));
        assert_eq!(result.errors[0].code, ValidationCode::InvalidFormat);

        let accented = validate_phrase_form(&form("valid text", "señal, código", "", ""));
        assert!(accented.is_valid());
    }

    #[test]
    fn letters_outside_the_accepted_set_are_invalid_even_when_alphabetic() {
        let cedilla = validate_phrase_form(&form("valid text", "français", "", ""));
        assert_eq!(cedilla.errors[0].field, "tags");
        assert_eq!(cedilla.errors[0].code, ValidationCode::InvalidFormat);

        let cjk = validate_phrase_form(&form("valid text", "北京", "", ""));
        assert_eq!(cjk.errors[0].code, ValidationCode::InvalidFormat);

        let uppercase_accent = validate_phrase_form(&form("valid text", "Ánimo", "", ""));
        assert!(uppercase_accent.is_valid());
    }

    #[test]
    fn sanitize_strips_letters_outside_the_accepted_set() {
        assert_eq!(sanitize_input("français 北京"), "franais");
        assert_eq!(sanitize_input("Árbol Ñoño"), "Árbol Ñoño");
    }

    #[test]
    fn validation_is_total_and_deterministic() {
        let weird = form("\u{0000}\u{ffff}", "\t,,, ,", "\n", "🤖");
        let first = validate_phrase_form(&weird);
        let second = validate_phrase_form(&weird);
        assert_eq!(first, second);
    }

    #[test]
    fn parse_tags_trims_and_drops_empties() {
        assert_eq!(parse_tags(" a , b ,, c "), vec!["a", "b", "c"]);
        assert!(parse_tags("   ").is_empty());
    }

    #[test]
    fn remaining_characters_never_underflows() {
        assert_eq!(remaining_characters(&"x".repeat(600), 500), 0);
        assert_eq!(remaining_characters("abc", 500), 497);
    }
}
