//! HTML form payloads and their validation.
//!
//! Forms are trimmed with `normalize` before `validate`, so "blank" and
//! "empty" are the same thing to the validators.

use std::collections::BTreeMap;

use serde::Deserialize;
use validator::Validate;

use crate::db::Role;

pub const BLANK: &str = "This field cannot be blank";
pub const BAD_EMAIL: &str = "This field must be a valid email address";
pub const SHORT_PASSWORD: &str = "This field must be at least 8 characters long";
pub const EMAIL_IN_USE: &str = "Email address is already in use";
pub const BAD_CREDENTIALS: &str = "Email or password is incorrect";

/// Field-level and form-level messages shown next to a form.
#[derive(Debug, Clone, Default)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
    non_field: Vec<String>,
}

impl FormErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the first message reported for each field.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            if let Some(message) = field_errors.iter().find_map(|e| e.message.as_ref()) {
                form_errors.add_field(&field.to_string(), &message.to_string());
            }
        }
        form_errors
    }

    /// Record a message for a field unless it already has one.
    pub fn add_field(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record a message about the whole form.
    pub fn add_non_field(&mut self, message: &str) {
        self.non_field.push(message.to_string());
    }

    /// Message for a field, if any.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Re-key field messages, `(from, to)`.
    pub fn rename_fields(mut self, names: &[(&str, &str)]) -> Self {
        for (from, to) in names {
            if let Some(message) = self.fields.remove(*from) {
                self.fields.insert((*to).to_string(), message);
            }
        }
        self
    }

    /// Form-level messages.
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// Validate a normalized form, returning its errors.
pub fn check<T: Validate>(form: &T) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::new(),
        Err(errors) => FormErrors::from_validation(errors),
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Empty optional inputs mean "not provided".
fn none_if_empty(value: &mut Option<String>) {
    if value.as_deref().is_some_and(str::is_empty) {
        *value = None;
    }
}

/// `POST /user/signup`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "This field must be at least 8 characters long"))]
    pub password: String,
    pub csrf_token: String,
}

impl SignupForm {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.email);
    }
}

/// `POST /user/login`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub password: String,
    pub csrf_token: String,
}

impl LoginForm {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.email);
    }
}

/// Forms carrying only the CSRF token (logout, delete).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CsrfForm {
    pub csrf_token: String,
}

/// `POST /user/edit/{id}` (administrators).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserEditForm {
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    /// Blank keeps the current password.
    #[validate(length(min = 8, max = 128, message = "This field must be at least 8 characters long"))]
    pub password: Option<String>,
    pub role: String,
    pub csrf_token: String,
}

impl UserEditForm {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.role);
        none_if_empty(&mut self.password);
    }

    /// Validate, including the role choice.
    pub fn check(&self) -> (FormErrors, Option<Role>) {
        let mut errors = check(self);
        let role = self.role.parse::<Role>().ok();
        if role.is_none() {
            errors.add_field("role", "Please choose a valid role");
        }
        (errors, role)
    }
}

/// `POST /user/update/` (self-service).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AccountForm {
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    /// Blank keeps the current password.
    #[validate(length(min = 8, max = 128, message = "This field must be at least 8 characters long"))]
    pub password: Option<String>,
    pub csrf_token: String,
}

impl AccountForm {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.email);
        none_if_empty(&mut self.password);
    }
}

/// Upload inputs whose HTML names differ from the struct fields.
const UPLOAD_INPUT_NAMES: [(&str, &str); 5] = [
    ("doc_name", "docName"),
    ("recipient_name", "recipientName"),
    ("recipient_email", "recipientEmail"),
    ("sender_name", "senderName"),
    ("sender_email", "senderEmail"),
];

/// Text fields of the upload form (`multipart/form-data`).
#[derive(Debug, Clone, Default, Validate)]
pub struct FileCreateForm {
    /// Display name; the uploaded filename when blank.
    pub doc_name: String,
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub recipient_name: String,
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub recipient_email: String,
    #[validate(length(min = 1, message = "This field cannot be blank"))]
    pub sender_name: String,
    #[validate(
        length(min = 1, message = "This field cannot be blank"),
        email(message = "This field must be a valid email address")
    )]
    pub sender_email: String,
    /// Raw expiry input, in days.
    pub expires: String,
    pub csrf_token: String,
}

impl FileCreateForm {
    /// Store one multipart text field; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let value = value.trim().to_string();
        match name {
            "docName" => self.doc_name = value,
            "recipientName" => self.recipient_name = value,
            "recipientEmail" => self.recipient_email = value,
            "senderName" => self.sender_name = value,
            "senderEmail" => self.sender_email = value,
            "expires" => self.expires = value,
            "csrf_token" => self.csrf_token = value,
            _ => {}
        }
    }

    /// Validate, including the expiry range. Returns the expiry in days.
    ///
    /// Messages are keyed by the HTML input names.
    pub fn check(&self) -> (FormErrors, Option<i64>) {
        let mut errors = check(self).rename_fields(&UPLOAD_INPUT_NAMES);
        let expires = self
            .expires
            .parse::<i64>()
            .ok()
            .filter(|days| (1..=crate::file::MAX_EXPIRY_DAYS).contains(days));
        if expires.is_none() {
            errors.add_field("expires", "This field must be a number of days between 1 and 3650");
        }
        if self.doc_name.chars().count() > crate::file::MAX_DOC_NAME_LENGTH {
            errors.add_field("docName", "This field is too long");
        }
        (errors, expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_blank_fields() {
        let mut form = SignupForm {
            name: "   ".to_string(),
            email: String::new(),
            password: "short".to_string(),
            csrf_token: String::new(),
        };
        form.normalize();
        let errors = check(&form);

        assert_eq!(errors.field("name"), Some(BLANK));
        assert!(errors.field("email").is_some());
        assert_eq!(errors.field("password"), Some(SHORT_PASSWORD));
    }

    #[test]
    fn test_signup_bad_email() {
        let mut form = SignupForm {
            name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            csrf_token: String::new(),
        };
        form.normalize();
        let errors = check(&form);

        assert_eq!(errors.field("email"), Some(BAD_EMAIL));
        assert!(errors.field("name").is_none());
    }

    #[test]
    fn test_signup_valid() {
        let mut form = SignupForm {
            name: " Alice ".to_string(),
            email: " alice@example.com ".to_string(),
            password: "password123".to_string(),
            csrf_token: String::new(),
        };
        form.normalize();
        assert!(check(&form).is_empty());
        assert_eq!(form.email, "alice@example.com");
    }

    #[test]
    fn test_user_edit_blank_password_is_optional() {
        let mut form = UserEditForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: Some(String::new()),
            role: "guest".to_string(),
            csrf_token: String::new(),
        };
        form.normalize();
        let (errors, role) = form.check();

        assert!(errors.is_empty());
        assert_eq!(role, Some(Role::Guest));
        assert!(form.password.is_none());
    }

    #[test]
    fn test_user_edit_short_password_and_bad_role() {
        let mut form = UserEditForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: Some("short".to_string()),
            role: "root".to_string(),
            csrf_token: String::new(),
        };
        form.normalize();
        let (errors, role) = form.check();

        assert_eq!(errors.field("password"), Some(SHORT_PASSWORD));
        assert!(errors.field("role").is_some());
        assert!(role.is_none());
    }

    #[test]
    fn test_file_create_form() {
        let mut form = FileCreateForm::default();
        form.set("recipientName", " Foo ".to_string());
        form.set("recipientEmail", "foo@bar.com".to_string());
        form.set("senderName", "Cheryl Smith".to_string());
        form.set("senderEmail", "cheryl@example.com".to_string());
        form.set("expires", "365".to_string());
        form.set("unknown", "ignored".to_string());

        let (errors, expires) = form.check();
        assert!(errors.is_empty());
        assert_eq!(expires, Some(365));
        assert_eq!(form.recipient_name, "Foo");
    }

    #[test]
    fn test_file_create_form_errors_use_input_names() {
        let mut form = FileCreateForm::default();
        form.set("recipientName", "  ".to_string());
        form.set("recipientEmail", "not-an-email".to_string());
        form.set("senderEmail", "cheryl@example.com".to_string());
        form.set("expires", "365".to_string());

        let (errors, _) = form.check();

        assert_eq!(errors.field("recipientName"), Some(BLANK));
        assert_eq!(errors.field("recipientEmail"), Some(BAD_EMAIL));
        assert_eq!(errors.field("senderName"), Some(BLANK));
        assert!(errors.field("senderEmail").is_none());
        assert!(errors.field("recipient_name").is_none());
    }

    #[test]
    fn test_file_create_form_bad_expiry() {
        for value in ["0", "-1", "3651", "ten", ""] {
            let mut form = FileCreateForm::default();
            form.set("expires", value.to_string());
            let (errors, expires) = form.check();
            assert!(expires.is_none(), "{value} accepted");
            assert!(errors.field("expires").is_some());
        }
    }

    #[test]
    fn test_form_errors_non_field() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());
        errors.add_non_field(BAD_CREDENTIALS);
        errors.add_field("email", EMAIL_IN_USE);
        errors.add_field("email", BAD_EMAIL);

        assert_eq!(errors.non_field(), [BAD_CREDENTIALS.to_string()]);
        assert_eq!(errors.field("email"), Some(EMAIL_IN_USE));
    }
}
