use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::AttendeeRequest;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_EMAIL_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeField {
    UserName,
    FirstName,
    LastName,
    EmailAddress,
}

impl AttendeeField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserName => "user_name",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::EmailAddress => "email_address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: AttendeeField,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.message)
    }
}

/// Checks every field and returns the trimmed request, or all field errors
/// at once.
pub fn validate_attendee(request: &AttendeeRequest) -> Result<AttendeeRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let user_name = request.user_name.trim();
    if user_name.is_empty() {
        errors.push(field_error(AttendeeField::UserName, "user name is required"));
    }

    let first_name = request.first_name.trim();
    check_name(first_name, AttendeeField::FirstName, "first name", &mut errors);
    let last_name = request.last_name.trim();
    check_name(last_name, AttendeeField::LastName, "last name", &mut errors);

    let email_address = request.email_address.trim();
    if email_address.is_empty() {
        errors.push(field_error(
            AttendeeField::EmailAddress,
            "email address is required",
        ));
    } else if email_address.chars().count() > MAX_EMAIL_CHARS {
        errors.push(field_error(
            AttendeeField::EmailAddress,
            format!("email address must be at most {MAX_EMAIL_CHARS} characters"),
        ));
    } else if !is_plausible_email(email_address) {
        errors.push(field_error(
            AttendeeField::EmailAddress,
            "email address is not valid",
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AttendeeRequest {
        user_name: user_name.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email_address: email_address.to_string(),
    })
}

fn check_name(value: &str, field: AttendeeField, label: &str, errors: &mut Vec<FieldError>) {
    if value.is_empty() {
        errors.push(field_error(field, format!("{label} is required")));
    } else if value.chars().count() > MAX_NAME_CHARS {
        errors.push(field_error(
            field,
            format!("{label} must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn field_error(field: AttendeeField, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}
