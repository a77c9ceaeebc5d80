//! Input validation for the login, signup, new post and comment forms.
//!
//! Failures are reported per field and block the request.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::NewPost;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*$").expect("username pattern is valid"));

pub const MAX_TAG_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct FormErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    /// First message for `field`.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = Vec::new();
        for (field, list) in errors.field_errors() {
            for error in list.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid ({})", error.code));
                fields.push(FieldError {
                    field: field.to_string(),
                    message,
                });
            }
        }
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        FormErrors(fields)
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Run the derived validators plus `extra`, collecting everything.
fn run<T: Validate>(
    form: &T,
    extra: impl FnOnce(&mut ValidationErrors),
) -> Result<(), FormErrors> {
    let mut errors = match form.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    extra(&mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct LoginForm {
    #[validate(
        email(message = "Invalid email address"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn check(&self) -> Result<(), FormErrors> {
        run(self, |_| {})
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct SignupForm {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username must be between 3 and 20 characters"
    ))]
    pub username: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn check(&self) -> Result<(), FormErrors> {
        run(self, |errors| {
            if !USERNAME_RE.is_match(&self.username) {
                errors.add(
                    "username",
                    rule(
                        "username_format",
                        "Username must start with a letter and be only lowercase characters or numbers",
                    ),
                );
            }
            for error in password_rules(&self.password) {
                errors.add("password", error);
            }
            if self.password != self.confirm_password {
                errors.add(
                    "confirm_password",
                    rule("must_match", "Passwords don't match"),
                );
            }
        })
    }
}

fn password_rules(password: &str) -> Vec<ValidationError> {
    let mut failed = Vec::new();
    if password.chars().count() < 10 {
        failed.push(rule("password_length", "At least 10 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failed.push(rule("password_digit", "At least 1 number"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failed.push(rule("password_lowercase", "At least 1 lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failed.push(rule("password_uppercase", "At least 1 uppercase letter"));
    }
    failed
}

#[derive(Debug, Clone, Default, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Content must be 1 to 1000 characters"
    ))]
    pub content: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl PostForm {
    pub fn check(&self) -> Result<(), FormErrors> {
        run(self, |errors| {
            if self
                .tags
                .iter()
                .any(|t| t.trim().chars().count() > MAX_TAG_LEN)
            {
                errors.add(
                    "tags",
                    rule("tag_length", "Tag must be less than 20 characters"),
                );
            }
        })
    }

    /// Validated request body: tags lower-cased and de-duplicated.
    pub fn into_new_post(self) -> Result<NewPost, FormErrors> {
        self.check()?;
        let mut tags: Vec<String> = Vec::new();
        for tag in &self.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(NewPost {
            title: self.title,
            content: self.content,
            tags,
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CommentForm {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be 1 to 1000 characters"
    ))]
    pub content: String,
}

impl CommentForm {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        run(self, |errors| {
            if !self.content.is_empty() && self.content.trim().is_empty() {
                errors.add("content", rule("blank", "Comment cannot be blank"));
            }
        })
    }
}
