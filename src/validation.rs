// Input checks that run before any network call

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{encoder::EncodeError, models::FormInput};

pub const API_KEY_PREFIX: &str = "sk-ant-";

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Invalid API key format. Must start with \"sk-ant-\"")]
    MalformedApiKey,

    #[error("Please fill in all required fields correctly")]
    Form(Vec<FieldError>),

    #[error("{0}")]
    MissingContext(&'static str),

    #[error(transparent)]
    Document(#[from] EncodeError),
}

impl ValidationError {
    /// Per-field messages for inline display; empty for banner-only errors.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Form(fields) => fields,
            _ => &[],
        }
    }
}

pub fn validate_api_key(api_key: &str) -> Result<(), ValidationError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ValidationError::MissingApiKey);
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(ValidationError::MalformedApiKey);
    }
    Ok(())
}

pub fn is_email_shaped(email: &str) -> bool {
    let trimmed = email.trim();
    trimmed.len() <= 254 && EMAIL_SHAPE.is_match(trimmed)
}

impl FormInput {
    /// Required-field and email-shape checks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors: Vec<FieldError> = Self::REQUIRED_FIELDS
            .iter()
            .filter(|name| self.field(name).map_or(true, |v| v.trim().is_empty()))
            .map(|name| FieldError { field: *name, message: "This field is required" })
            .collect();

        if !self.sender_email.trim().is_empty() && !is_email_shaped(&self.sender_email) {
            errors.push(FieldError { field: "senderEmail", message: "Please enter a valid email address" });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Form(errors))
        }
    }
}
