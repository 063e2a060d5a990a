use regex::Regex;

use crate::error::Error;

/// Validates configuration values for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a Redis URL
    pub fn validate_redis_url(url: &str) -> Result<(), Error> {
        if url.is_empty() {
            return Err(Error::Configuration("Redis URL cannot be empty".to_string()));
        }

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(Error::Configuration(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates a bind address
    pub fn validate_bind_address(address: &str) -> Result<(), Error> {
        if address.is_empty() {
            return Err(Error::Configuration("Bind address cannot be empty".to_string()));
        }

        // Check if it looks like host:port format
        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
            _ => Err(Error::Configuration(
                "Bind address must be in host:port format".to_string(),
            )),
        }
    }

    /// Validates an allow-listed origin: `scheme://host[:port]`, nothing after
    pub fn validate_origin(origin: &str) -> Result<(), Error> {
        let pattern = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/\s?#]+$")
            .map_err(|e| Error::Configuration(e.to_string()))?;

        if !pattern.is_match(origin) {
            return Err(Error::Configuration(format!(
                "Allowed origin '{}' must be in scheme://host[:port] form",
                origin
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("redis://localhost:6379").is_ok());
        assert!(ConfigValidator::validate_redis_url("rediss://localhost:6379").is_ok());
    }

    #[test]
    fn test_invalid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("").is_err());
        assert!(ConfigValidator::validate_redis_url("http://localhost:6379").is_err());
    }

    #[test]
    fn test_valid_bind_address() {
        assert!(ConfigValidator::validate_bind_address("127.0.0.1:8080").is_ok());
        assert!(ConfigValidator::validate_bind_address("0.0.0.0:3000").is_ok());
    }

    #[test]
    fn test_invalid_bind_address() {
        assert!(ConfigValidator::validate_bind_address("").is_err());
        assert!(ConfigValidator::validate_bind_address("localhost").is_err());
        assert!(ConfigValidator::validate_bind_address("localhost:http").is_err());
    }

    #[test]
    fn test_valid_origins() {
        assert!(ConfigValidator::validate_origin("https://allowed-site.com").is_ok());
        assert!(ConfigValidator::validate_origin("http://localhost:3000").is_ok());
    }

    #[test]
    fn test_invalid_origins() {
        assert!(ConfigValidator::validate_origin("allowed-site.com").is_err());
        assert!(ConfigValidator::validate_origin("https://allowed-site.com/").is_err());
        assert!(ConfigValidator::validate_origin("https://allowed-site.com/path").is_err());
        assert!(ConfigValidator::validate_origin("https://").is_err());
    }
}
