use crate::utils::error::{CourierError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CourierError::ConfigValidationError {
            field: field_name.to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CourierError::ConfigValidationError {
                field: field_name.to_string(),
                message: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CourierError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_id(field_name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(CourierError::ValidationError {
            field: field_name.to_string(),
            reason: format!("must be a positive integer, got {}", value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CourierError::ValidationError {
            field: field_name.to_string(),
            reason: "value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_model_name(field_name: &str, value: &str, supported: &[&str]) -> Result<()> {
    if !supported.contains(&value) {
        return Err(CourierError::ValidationError {
            field: field_name.to_string(),
            reason: format!(
                "unsupported note type: {}. Supported types: {}",
                value,
                supported.join(", ")
            ),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CourierError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("connection.endpoint", "http://127.0.0.1:8765").is_ok());
        assert!(validate_url("connection.endpoint", "https://example.com").is_ok());
        assert!(validate_url("connection.endpoint", "").is_err());
        assert!(validate_url("connection.endpoint", "invalid-url").is_err());
        assert!(validate_url("connection.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_id() {
        assert!(validate_positive_id("deck_id", 1).is_ok());
        assert!(validate_positive_id("deck_id", 0).is_err());
        assert!(validate_positive_id("deck_id", -7).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("front", "hablar").is_ok());
        assert!(validate_non_empty_string("front", "").is_err());
        assert!(validate_non_empty_string("front", "   \n\t").is_err());
    }

    #[test]
    fn test_validate_model_name() {
        let supported = ["Basic", "Basic (and reversed card)"];
        assert!(validate_model_name("model", "Basic", &supported).is_ok());
        assert!(validate_model_name("model", "Cloze", &supported).is_err());
    }
}
