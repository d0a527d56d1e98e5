//! # Forms
//!
//! Raw field sets as submitted by HTML forms or JSON payloads, and their
//! validation into domain inputs. Both transports share these rules.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{FieldErrors, NON_FIELD_ERRORS};
use crate::models::{Car, CarInput};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const MAX_CHAR_FIELD: usize = 100;
pub const MAX_USERNAME: usize = 150;
pub const MIN_PASSWORD: usize = 8;

/// Writable car fields. Absent fields are `None`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CarFields {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CarFields {
    /// Every field must be present and valid.
    pub fn validate(&self) -> Result<CarInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let make = char_field(&mut errors, "make", self.make.as_deref());
        let model = char_field(&mut errors, "model", self.model.as_deref());
        let year = integer_field(&mut errors, "year", self.year.as_deref());
        let description = text_field(&mut errors, "description", self.description.as_deref());
        errors.into_result(CarInput {
            make,
            model,
            year,
            description,
        })
    }

    /// Absent fields keep the values of `current`; present ones must be valid.
    pub fn validate_partial(&self, current: &Car) -> Result<CarInput, FieldErrors> {
        let base = CarInput::from(current);
        let mut errors = FieldErrors::new();
        let make = match self.make.as_deref() {
            Some(raw) => char_field(&mut errors, "make", Some(raw)),
            None => base.make,
        };
        let model = match self.model.as_deref() {
            Some(raw) => char_field(&mut errors, "model", Some(raw)),
            None => base.model,
        };
        let year = match self.year.as_deref() {
            Some(raw) => integer_field(&mut errors, "year", Some(raw)),
            None => base.year,
        };
        let description = match self.description.as_deref() {
            Some(raw) => text_field(&mut errors, "description", Some(raw)),
            None => base.description,
        };
        errors.into_result(CarInput {
            make,
            model,
            year,
            description,
        })
    }
}

/// Writable comment fields. `car` and `author` are accepted and ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentFields {
    #[serde(default)]
    pub content: Option<String>,
}

impl CommentFields {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let content = text_field(&mut errors, "content", self.content.as_deref());
        errors.into_result(content)
    }
}

/// Account sign-up form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Field-level checks. Username uniqueness is checked against the store separately.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > MAX_USERNAME {
            errors.add("username", too_long(MAX_USERNAME, username.chars().count()));
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else {
            if self.password1.chars().count() < MIN_PASSWORD {
                errors.add(
                    "password1",
                    format!("This password is too short. It must contain at least {MIN_PASSWORD} characters."),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password1", "This password is entirely numeric.");
            }
            if !username.is_empty() && self.password1.eq_ignore_ascii_case(username) {
                errors.add("password1", "The password is too similar to the username.");
            }
        }

        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(())
    }
}

/// Username/password pair from the login page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result(())
    }
}

/// Message shown for a wrong username/password pair.
pub fn invalid_login() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add(
        NON_FIELD_ERRORS,
        "Please enter a correct username and password. Note that both fields may be case-sensitive.",
    );
    errors
}

fn char_field(errors: &mut FieldErrors, name: &str, raw: Option<&str>) -> String {
    let value = text_field(errors, name, raw);
    let len = value.chars().count();
    if len > MAX_CHAR_FIELD {
        errors.add(name, too_long(MAX_CHAR_FIELD, len));
    }
    value
}

fn text_field(errors: &mut FieldErrors, name: &str, raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            errors.add(name, REQUIRED);
            String::new()
        }
    }
}

fn integer_field(errors: &mut FieldErrors, name: &str, raw: Option<&str>) -> i32 {
    match raw.map(str::trim) {
        None | Some("") => {
            errors.add(name, REQUIRED);
            0
        }
        Some(value) => value.parse::<i32>().unwrap_or_else(|_| {
            errors.add(name, INVALID_INTEGER);
            0
        }),
    }
}

fn too_long(max: usize, len: usize) -> String {
    format!("Ensure this field has no more than {max} characters (it has {len}).")
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Accepts `"2020"` as well as `2020`, so HTML forms and JSON share one field type.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fields(make: &str, model: &str, year: &str, description: &str) -> CarFields {
        CarFields {
            make: Some(make.into()),
            model: Some(model.into()),
            year: Some(year.into()),
            description: Some(description.into()),
        }
    }

    #[test]
    fn valid_car_fields() {
        let input = fields("Toyota", " Camry ", "2020", "test").validate().unwrap();
        assert_eq!(input.make, "Toyota");
        assert_eq!(input.model, "Camry");
        assert_eq!(input.year, 2020);
    }

    #[test]
    fn missing_and_malformed_fields_are_reported_per_field() {
        let errors = CarFields {
            make: None,
            model: Some("   ".into()),
            year: Some("twenty".into()),
            description: Some("ok".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.for_field("make"), [REQUIRED.to_string()]);
        assert_eq!(errors.for_field("model"), [REQUIRED.to_string()]);
        assert_eq!(errors.for_field("year"), [INVALID_INTEGER.to_string()]);
        assert!(errors.for_field("description").is_empty());
    }

    #[test]
    fn make_longer_than_limit_is_rejected() {
        let errors = fields(&"x".repeat(101), "Camry", "2020", "d").validate().unwrap_err();
        assert!(errors.contains("make"));
    }

    #[test]
    fn partial_keeps_absent_fields() {
        let car = Car {
            id: 1,
            make: "Toyota".into(),
            model: "Camry".into(),
            year: 2020,
            description: "test".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner_id: 1,
            owner: "alice".into(),
        };
        let patch = CarFields {
            year: Some("2021".into()),
            ..Default::default()
        };
        let input = patch.validate_partial(&car).unwrap();
        assert_eq!(input.year, 2021);
        assert_eq!(input.make, "Toyota");
    }

    #[test]
    fn year_accepts_json_numbers_and_strings() {
        let from_number: CarFields = serde_json::from_str(r#"{"year": 1999}"#).unwrap();
        let from_string: CarFields = serde_json::from_str(r#"{"year": "1999"}"#).unwrap();
        let from_null: CarFields = serde_json::from_str(r#"{"year": null}"#).unwrap();
        assert_eq!(from_number.year.as_deref(), Some("1999"));
        assert_eq!(from_string.year.as_deref(), Some("1999"));
        assert_eq!(from_null.year, None);
    }

    #[test]
    fn blank_comment_is_rejected() {
        assert!(CommentFields::new("  ").validate().is_err());
        assert_eq!(CommentFields::new("Nice car").validate().unwrap(), "Nice car");
    }

    #[test]
    fn registration_rules() {
        let ok = RegistrationForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password1: "s3cret-pass".into(),
            password2: "s3cret-pass".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegistrationForm {
            username: "al ice".into(),
            email: "nope".into(),
            password1: "1234".into(),
            password2: "4321".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("email"));
        assert_eq!(errors.for_field("password1").len(), 2);
        assert!(errors.contains("password2"));
    }

    #[test]
    fn password_equal_to_username_is_rejected() {
        let form = RegistrationForm {
            username: "longusername".into(),
            email: "a@b.io".into(),
            password1: "LongUsername".into(),
            password2: "LongUsername".into(),
        };
        assert!(form.validate().unwrap_err().contains("password1"));
    }
}
