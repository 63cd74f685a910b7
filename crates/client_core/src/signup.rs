use std::{fmt, sync::OnceLock};

use regex::Regex;
use shared::{domain::Role, protocol::NewUser, protocol::User};
use thiserror::Error;

use crate::session::SessionManager;

pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created! Please login.";
pub const MIN_PASSWORD_CHARS: usize = 6;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Signup failed. Please try again.")]
    Rejected,
}

/// Raw signup input. The role defaults to employee and is submitted
/// upper-cased whatever case it was typed in.
#[derive(Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: String,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            phone_number: String::new(),
            role: "employee".into(),
        }
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .field("role", &self.role)
            .finish()
    }
}

impl SignupForm {
    /// Checks presence, then email shape, then password length.
    pub fn validate(&self) -> Result<(), SignupError> {
        let required = [&self.name, &self.email, &self.password, &self.phone_number];
        if required.iter().any(|field| field.is_empty()) {
            return Err(SignupError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(SignupError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(SignupError::PasswordTooShort);
        }
        Ok(())
    }

    pub fn into_new_user(self) -> Result<NewUser, SignupError> {
        self.validate()?;
        Ok(NewUser {
            name: self.name,
            email: self.email,
            password_hash: self.password,
            phone_number: self.phone_number,
            role: Role::parse(&self.role),
        })
    }
}

/// Validates and creates the account. The caller is not signed in
/// afterwards; it is expected to log in with the new credentials.
pub async fn submit_signup(
    session: &SessionManager,
    form: SignupForm,
) -> Result<User, SignupError> {
    let new_user = form.into_new_user()?;
    session
        .signup(&new_user)
        .await
        .ok_or(SignupError::Rejected)
}

#[cfg(test)]
#[path = "tests/signup_tests.rs"]
mod tests;
