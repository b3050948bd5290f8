use crate::utils::error::{MarketError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 驗證規則的可調參數，來自設定檔的 `[validation]` 區段
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    pub min_year: i32,
    pub max_year: i32,
    pub max_mileage: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_year: 1886,
            max_year: current_year() + 1,
            max_mileage: 2_000_000,
        }
    }
}

pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

pub fn validate_url(entity: &str, field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(MarketError::validation(entity, field_name, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MarketError::validation(
                entity,
                field_name,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(MarketError::validation(
            entity,
            field_name,
            format!("Invalid URL format: {}", e),
        )),
    }
}

/// 空字串視為未設定
pub fn validate_optional_url(entity: &str, field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Ok(());
    }
    validate_url(entity, field_name, url_str)
}

pub fn validate_non_empty_string(entity: &str, field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MarketError::validation(
            entity,
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_email(entity: &str, field_name: &str, value: &str) -> Result<()> {
    static EMAIL: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    let re = EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))
        .as_ref()
        .map_err(|e| MarketError::ConfigValidationError {
            field: "email_pattern".to_string(),
            message: format!("Invalid email pattern: {}", e),
        })?;

    if !re.is_match(value) {
        return Err(MarketError::validation(
            entity,
            field_name,
            format!("'{}' is not an email address", value),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    entity: &str,
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(MarketError::validation(
            entity,
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("vehicle", "photoUrls", "https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_url("vehicle", "photoUrls", "http://cdn.example.com/a.jpg").is_ok());
        assert!(validate_url("vehicle", "photoUrls", "").is_err());
        assert!(validate_url("vehicle", "photoUrls", "not a url").is_err());
        assert!(validate_url("vehicle", "photoUrls", "ftp://cdn.example.com/a.jpg").is_err());
        assert!(validate_optional_url("user", "profilePhotoUrl", "").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user", "email", "amine@example.tn").is_ok());
        assert!(validate_email("user", "email", "amine@example").is_err());
        assert!(validate_email("user", "email", "no at sign").is_err());
        assert!(matches!(
            validate_email("user", "email", "a b@c.d"),
            Err(MarketError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("vehicle", "year", 2015, 1886, 2030).is_ok());
        assert!(validate_range("vehicle", "year", 1700, 1886, 2030).is_err());
    }
}
