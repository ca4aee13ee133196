//! Request field validation

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::errors::AppError;
use crate::utils::slugify;

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").expect("valid regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});

static ENV_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// `git@host:owner/repo.git`
static SCP_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:[^\s]+$").expect("valid regex"));

const MAX_NAME_LEN: usize = 100;
const MAX_DOMAIN_LEN: usize = 253;

/// Trimmed name of at most 100 characters with at least one ASCII letter or digit
pub fn project_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError("Project name is required".to_string()));
    }
    if slugify(name).is_empty() {
        return Err(AppError::ValidationError(
            "Project name must contain letters or digits".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "Project name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

pub fn repository_url(url: &str) -> Result<String, AppError> {
    let url = url.trim();
    if SCP_LIKE_RE.is_match(url) {
        return Ok(url.to_string());
    }
    match Url::parse(url) {
        Ok(parsed)
            if matches!(parsed.scheme(), "http" | "https" | "git" | "ssh")
                && parsed.host_str().is_some() =>
        {
            Ok(url.to_string())
        }
        _ => Err(AppError::ValidationError(
            "Invalid repository URL".to_string(),
        )),
    }
}

/// Lowercased domain name
pub fn domain(domain: &str) -> Result<String, AppError> {
    let domain = domain.trim().to_ascii_lowercase();
    if domain.len() > MAX_DOMAIN_LEN || !DOMAIN_RE.is_match(&domain) {
        return Err(AppError::ValidationError("Invalid domain format".to_string()));
    }
    Ok(domain)
}

pub fn email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(email)
}

pub fn env_key(key: &str) -> Result<String, AppError> {
    if !ENV_KEY_RE.is_match(key) {
        return Err(AppError::ValidationError(
            "Environment variable names may contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(key.to_string())
}
