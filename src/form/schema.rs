use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_SPECIAL_CHARS: &[char] = &['@', '$', '!', '%', '*', '?', '&'];

pub const NAME_TOO_SHORT: &str = "Min Length At Least 3";
pub const NAME_TOO_LONG: &str = "Max length almost 20 characters";
pub const EMAIL_INVALID: &str = "Invalid email address";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const PASSWORD_NEEDS_UPPERCASE: &str = "At least 1 Uppercase letter required";
pub const PASSWORD_NEEDS_DIGIT: &str = "At least 1 Number required";
pub const PASSWORD_NEEDS_SPECIAL: &str = "At least 1 special character required";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldName {
    Name,
    Email,
    Password,
}

impl FieldName {
    pub const ALL: [FieldName; 3] = [FieldName::Name, FieldName::Email, FieldName::Password];

    pub const fn as_str(self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Email => "email",
            FieldName::Password => "password",
        }
    }

    /// Caption shown next to the input.
    pub const fn label(self) -> &'static str {
        match self {
            FieldName::Name => "First Name",
            FieldName::Email => "Email",
            FieldName::Password => "Password",
        }
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, unvalidated input keyed by field. A missing key reads as `""`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<FieldName, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldName) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }
}

/// The record a valid form produces.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Violations per field. Fields that passed have no entry.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldName, Vec<&'static str>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FieldName) -> &[&'static str] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, field: FieldName) -> Option<&'static str> {
        self.get(field).first().copied()
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    /// Fields with violations, in `FieldName::ALL` order.
    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &[&'static str])> + '_ {
        self.0
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }

    /// Replaces the entry for `field`; an empty list removes it.
    pub(crate) fn replace(&mut self, field: FieldName, messages: Vec<&'static str>) {
        if messages.is_empty() {
            self.0.remove(&field);
        } else {
            self.0.insert(field, messages);
        }
    }

    pub(crate) fn truncate_to_first(&mut self) {
        for messages in self.0.values_mut() {
            messages.truncate(1);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Clone, Copy)]
pub struct Rule {
    pub check: fn(&str) -> bool,
    pub message: &'static str,
}

impl Rule {
    const fn new(check: fn(&str) -> bool, message: &'static str) -> Self {
        Self { check, message }
    }

    pub fn holds(&self, value: &str) -> bool {
        (self.check)(value)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("message", &self.message).finish()
    }
}

static NAME_RULES: [Rule; 2] = [
    Rule::new(name_long_enough, NAME_TOO_SHORT),
    Rule::new(name_short_enough, NAME_TOO_LONG),
];

static EMAIL_RULES: [Rule; 1] = [Rule::new(is_email, EMAIL_INVALID)];

static PASSWORD_RULES: [Rule; 4] = [
    Rule::new(password_long_enough, PASSWORD_TOO_SHORT),
    Rule::new(has_uppercase, PASSWORD_NEEDS_UPPERCASE),
    Rule::new(has_digit, PASSWORD_NEEDS_DIGIT),
    Rule::new(has_special, PASSWORD_NEEDS_SPECIAL),
];

/// Length in UTF-16 code units, the unit browser form inputs count in.
fn text_len(value: &str) -> usize {
    value.encode_utf16().count()
}

fn name_long_enough(value: &str) -> bool {
    text_len(value) >= NAME_MIN_LEN
}

fn name_short_enough(value: &str) -> bool {
    text_len(value) <= NAME_MAX_LEN
}

fn password_long_enough(value: &str) -> bool {
    text_len(value) >= PASSWORD_MIN_LEN
}

fn has_uppercase(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_uppercase())
}

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

fn has_special(value: &str) -> bool {
    value.contains(PASSWORD_SPECIAL_CHARS)
}

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
});

fn is_email(value: &str) -> bool {
    if value.starts_with('.') || value.contains("..") {
        return false;
    }
    match EMAIL_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(value),
        Err(error) => {
            tracing::error!(%error, "email pattern failed to compile");
            false
        }
    }
}

/// Ordered rule list for `field`.
pub fn rules(field: FieldName) -> &'static [Rule] {
    match field {
        FieldName::Name => &NAME_RULES,
        FieldName::Email => &EMAIL_RULES,
        FieldName::Password => &PASSWORD_RULES,
    }
}

/// Every failing rule message for one field, in rule order.
pub fn validate_field(field: FieldName, value: &str) -> Vec<&'static str> {
    rules(field)
        .iter()
        .filter(|rule| !rule.holds(value))
        .map(|rule| rule.message)
        .collect()
}

pub fn validate(values: &FormValues) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in FieldName::ALL {
        errors.replace(field, validate_field(field, values.get(field)));
    }
    errors
}

pub fn validate_record(values: &FormValues) -> Result<SignupRecord, FieldErrors> {
    let errors = validate(values);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(SignupRecord {
        name: values.get(FieldName::Name).to_owned(),
        email: values.get(FieldName::Email).to_owned(),
        password: values.get(FieldName::Password).to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_values() -> FormValues {
        FormValues::new()
            .with(FieldName::Name, "Ada")
            .with(FieldName::Email, "ada@example.com")
            .with(FieldName::Password, "Abcdefg1!")
    }

    #[test]
    fn valid_values_produce_no_errors() {
        assert!(validate(&valid_values()).is_empty());
        let record = validate_record(&valid_values()).expect("record");
        assert_eq!(record.name, "Ada");
        assert_eq!(record.password, "Abcdefg1!");
    }

    #[test]
    fn empty_form_fails_every_floor() {
        let errors = validate(&FormValues::new());
        assert_eq!(errors.get(FieldName::Name), [NAME_TOO_SHORT]);
        assert_eq!(errors.get(FieldName::Email), [EMAIL_INVALID]);
        assert_eq!(
            errors.get(FieldName::Password),
            [
                PASSWORD_TOO_SHORT,
                PASSWORD_NEEDS_UPPERCASE,
                PASSWORD_NEEDS_DIGIT,
                PASSWORD_NEEDS_SPECIAL,
            ]
        );
    }

    #[test]
    fn name_length_bounds() {
        assert_eq!(validate_field(FieldName::Name, "ab"), [NAME_TOO_SHORT]);
        assert!(validate_field(FieldName::Name, "abc").is_empty());
        assert!(validate_field(FieldName::Name, &"a".repeat(20)).is_empty());
        assert_eq!(
            validate_field(FieldName::Name, &"a".repeat(21)),
            [NAME_TOO_LONG]
        );
        // whitespace counts as characters
        assert!(validate_field(FieldName::Name, "   ").is_empty());
        // lengths are UTF-16 code units, not bytes or chars
        assert!(validate_field(FieldName::Name, "Zoë").is_empty());
        assert!(validate_field(FieldName::Name, "\u{1F600}\u{1F600}").is_empty());
        assert_eq!(validate_field(FieldName::Name, "\u{1F600}"), [NAME_TOO_SHORT]);
        assert_eq!(
            validate_field(FieldName::Name, &"\u{1F600}".repeat(11)),
            [NAME_TOO_LONG]
        );
        assert!(validate_field(FieldName::Password, "Ab1!\u{1F600}\u{1F600}").is_empty());
    }

    #[test]
    fn email_grammar() {
        for accepted in [
            "user@example.com",
            "first.last+tag@mail.example.org",
            "O'Neil@Example.CO",
            "a_b-c@sub-domain.example.io",
        ] {
            assert!(is_email(accepted), "{accepted} should be accepted");
        }
        for rejected in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@example",
            "user@example.c",
            ".user@example.com",
            "us..er@example.com",
            "user.@example.com",
            "user@-example.com",
            "user@example..com",
            "user name@example.com",
            "\u{212A}evin@example.com",
            "user@example.co\u{017F}",
            "j\u{00F6}rg@example.com",
        ] {
            assert!(!is_email(rejected), "{rejected} should be rejected");
        }
    }

    #[test]
    fn password_reports_every_unmet_rule() {
        assert_eq!(validate_field(FieldName::Password, "abc").len(), 4);
        assert!(validate_field(FieldName::Password, "Abcdefg1!").is_empty());
        assert_eq!(
            validate_field(FieldName::Password, "abcdefgh1!"),
            [PASSWORD_NEEDS_UPPERCASE]
        );
        assert_eq!(
            validate_field(FieldName::Password, "Abcdefgh!"),
            [PASSWORD_NEEDS_DIGIT]
        );
        assert_eq!(
            validate_field(FieldName::Password, "Abcdefgh1"),
            [PASSWORD_NEEDS_SPECIAL]
        );
        // character classes match anywhere, not at fixed positions
        assert!(validate_field(FieldName::Password, "!1abcdeZ").is_empty());
    }

    #[test]
    fn validation_is_deterministic() {
        let values = FormValues::new()
            .with(FieldName::Name, "x")
            .with(FieldName::Password, "short");
        assert_eq!(validate(&values), validate(&values));
        assert_eq!(
            validate(&values).fields().collect::<Vec<_>>(),
            FieldName::ALL.to_vec()
        );
    }

    #[test]
    fn field_names_serialize_lowercase() {
        let values = valid_values();
        let json = serde_json::to_value(&values).expect("serialize values");
        assert_eq!(json["email"], "ada@example.com");
        let errors = validate(&FormValues::new().with(FieldName::Name, "Ada"));
        let json = serde_json::to_value(&errors).expect("serialize errors");
        assert!(json.get("name").is_none());
        assert_eq!(json["email"][0], EMAIL_INVALID);
    }
}
