use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::users::repo_types::NewUser;

pub const NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 6;
pub const CONTENT_MAX: usize = 140;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9.-]+\.[A-Za-z]+$").expect("email regex compiles");
}

/// Field a validation error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Password,
    PasswordConfirmation,
    Content,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordConfirmation => "password_confirmation",
            Field::Content => "content",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldErrorKind {
    Blank,
    TooLong { max: usize },
    TooShort { min: usize },
    Invalid,
    Taken,
    Mismatch { other: Field },
}

/// One rejected field. Validation returns these as data; it never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: Field, kind: FieldErrorKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldErrorKind::Blank => write!(f, "{} can't be blank", self.field),
            FieldErrorKind::TooLong { max } => {
                write!(f, "{} is too long (maximum is {max} characters)", self.field)
            }
            FieldErrorKind::TooShort { min } => {
                write!(f, "{} is too short (minimum is {min} characters)", self.field)
            }
            FieldErrorKind::Invalid => write!(f, "{} is invalid", self.field),
            FieldErrorKind::Taken => write!(f, "{} has already been taken", self.field),
            FieldErrorKind::Mismatch { other } => {
                write!(f, "{} doesn't match {other}", self.field)
            }
        }
    }
}

/// Trim and lowercase an email the way it is persisted.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Length is measured on the trimmed value, which is what gets stored.
fn check_present_and_bounded(field: Field, value: &str, max: usize) -> Option<FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Some(FieldError::new(field, FieldErrorKind::Blank));
    }
    if value.chars().count() > max {
        return Some(FieldError::new(field, FieldErrorKind::TooLong { max }));
    }
    None
}

pub fn check_name(name: &str) -> Option<FieldError> {
    check_present_and_bounded(Field::Name, name, NAME_MAX)
}

pub fn check_email(email: &str) -> Option<FieldError> {
    check_present_and_bounded(Field::Email, email, EMAIL_MAX).or_else(|| {
        (!is_valid_email(email)).then(|| FieldError::new(Field::Email, FieldErrorKind::Invalid))
    })
}

pub fn check_password(password: &str) -> Option<FieldError> {
    if password.trim().is_empty() {
        return Some(FieldError::new(Field::Password, FieldErrorKind::Blank));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Some(FieldError::new(
            Field::Password,
            FieldErrorKind::TooShort { min: PASSWORD_MIN },
        ));
    }
    None
}

pub fn check_password_confirmation(password: &str, confirmation: &str) -> Option<FieldError> {
    (password != confirmation).then(|| {
        FieldError::new(
            Field::PasswordConfirmation,
            FieldErrorKind::Mismatch {
                other: Field::Password,
            },
        )
    })
}

pub fn check_content(content: &str) -> Option<FieldError> {
    check_present_and_bounded(Field::Content, content, CONTENT_MAX)
}

/// Field-level checks that need no store lookup. Uniqueness is checked in
/// [`crate::users::services::validate`].
pub fn validate_fields(draft: &NewUser) -> Vec<FieldError> {
    [
        check_name(&draft.name),
        check_email(&draft.email),
        check_password(&draft.password),
        check_password_confirmation(&draft.password, &draft.password_confirmation),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewUser {
        NewUser {
            name: "Example User".into(),
            email: "example@user.com".into(),
            password: "foobar".into(),
            password_confirmation: "foobar".into(),
        }
    }

    #[test]
    fn example_user_is_valid() {
        assert!(validate_fields(&draft()).is_empty());
    }

    #[test]
    fn name_must_be_present() {
        let mut user = draft();
        user.name = "    ".into();
        assert_eq!(
            validate_fields(&user),
            vec![FieldError::new(Field::Name, FieldErrorKind::Blank)]
        );
    }

    #[test]
    fn email_must_be_present() {
        let mut user = draft();
        user.email = "    ".into();
        assert_eq!(
            validate_fields(&user),
            vec![FieldError::new(Field::Email, FieldErrorKind::Blank)]
        );
    }

    #[test]
    fn name_length_boundary() {
        assert!(check_name(&"a".repeat(NAME_MAX)).is_none());
        assert_eq!(
            check_name(&"a".repeat(NAME_MAX + 1)),
            Some(FieldError::new(Field::Name, FieldErrorKind::TooLong { max: 50 }))
        );
    }

    #[test]
    fn email_must_not_be_too_long() {
        let email = format!("{}@example.com", "a".repeat(244));
        assert_eq!(email.len(), 256);
        assert_eq!(
            check_email(&email),
            Some(FieldError::new(Field::Email, FieldErrorKind::TooLong { max: 255 }))
        );
    }

    #[test]
    fn accepts_valid_addresses() {
        for address in [
            "user@example.com",
            "USER@foo.com",
            "A_sausage-man@boo.org.com",
            "money@sasuage.jp",
            "alice+bob@aron.cn",
        ] {
            assert!(check_email(address).is_none(), "{address:?} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_addresses() {
        for address in [
            "user@example,com",
            "user_at_foo.org",
            "user@example.",
            "foo@bar_baz.com",
        ] {
            assert_eq!(
                check_email(address),
                Some(FieldError::new(Field::Email, FieldErrorKind::Invalid)),
                "{address:?} should be invalid"
            );
        }
    }

    #[test]
    fn password_has_minimum_length() {
        let mut user = draft();
        user.password = "a".repeat(5);
        assert_eq!(
            validate_fields(&user),
            vec![FieldError::new(
                Field::Password,
                FieldErrorKind::TooShort { min: 6 }
            )]
        );
    }

    #[test]
    fn blank_password_is_rejected() {
        assert_eq!(
            check_password("      "),
            Some(FieldError::new(Field::Password, FieldErrorKind::Blank))
        );
    }

    #[test]
    fn collects_every_failing_field() {
        let user = NewUser {
            name: String::new(),
            email: "nope".into(),
            password: "abc".into(),
            password_confirmation: "abcd".into(),
        };
        let fields: Vec<Field> = validate_fields(&user).into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Email,
                Field::Password,
                Field::PasswordConfirmation
            ]
        );
    }

    #[test]
    fn confirmation_must_match_password() {
        let mut user = draft();
        user.password_confirmation = "barfoo".into();
        let errors = validate_fields(&user);
        assert_eq!(
            errors,
            vec![FieldError::new(
                Field::PasswordConfirmation,
                FieldErrorKind::Mismatch {
                    other: Field::Password
                }
            )]
        );
        assert_eq!(
            errors[0].to_string(),
            "password_confirmation doesn't match password"
        );
    }

    #[test]
    fn length_is_measured_after_trimming() {
        let padded = format!("  {}  ", "a".repeat(NAME_MAX));
        assert!(check_name(&padded).is_none());
        let padded = format!(" {}\n", "a".repeat(CONTENT_MAX));
        assert!(check_content(&padded).is_none());
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_email("  Foo@ExAMPle.CoM "), "foo@example.com");
    }

    #[test]
    fn content_is_bounded() {
        assert!(check_content("Lorem ipsum").is_none());
        assert_eq!(
            check_content(" "),
            Some(FieldError::new(Field::Content, FieldErrorKind::Blank))
        );
        assert_eq!(
            check_content(&"a".repeat(141)),
            Some(FieldError::new(Field::Content, FieldErrorKind::TooLong { max: 140 }))
        );
    }

    #[test]
    fn field_error_serializes_flat() {
        let json = serde_json::to_value(FieldError::new(
            Field::Name,
            FieldErrorKind::TooLong { max: 50 },
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "field": "name", "kind": "too_long", "max": 50 })
        );
    }
}
