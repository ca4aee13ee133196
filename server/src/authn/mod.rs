//! Admin login and bearer-token checks

pub mod guard;
pub mod token;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::app::options::AuthOptions;
use crate::errors::{AppError, INVALID_CREDENTIALS};
use crate::models::team::TeamRole;
use token::{Claims, IssuedToken, JwtKeys};

pub struct Authenticator {
    required: bool,
    keys: JwtKeys,
    admin_email: String,
    admin_password: Option<SecretString>,
    token_ttl: Duration,
}

impl Authenticator {
    pub fn new(options: AuthOptions) -> Self {
        Self {
            required: options.required,
            keys: JwtKeys::new(&options.jwt_secret),
            admin_email: options.admin_email,
            admin_password: options.admin_password,
            token_ttl: options.token_ttl,
        }
    }

    /// Whether protected routes need a bearer token
    pub fn required(&self) -> bool {
        self.required
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Exchange the admin credentials for a token
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AppError> {
        let expected = self.admin_password.as_ref().ok_or_else(|| {
            AppError::unauthorized("Password login is not configured", INVALID_CREDENTIALS)
        })?;

        let email_ok = email.trim().eq_ignore_ascii_case(&self.admin_email);
        let password_ok = constant_time_eq(password.as_bytes(), expected.expose_secret().as_bytes());
        if !(email_ok && password_ok) {
            return Err(AppError::unauthorized("Invalid credentials", INVALID_CREDENTIALS));
        }

        let ttl = chrono::Duration::from_std(self.token_ttl)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        self.keys
            .issue(&self.admin_email, &TeamRole::Owner.to_string(), ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.keys.verify(token)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
