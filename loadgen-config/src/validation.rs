//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} scheme '{}' not supported (only http/https)", field_name, scheme),
        }),
    }
}

/// Validate a `host:port` socket address
pub fn validate_socket_addr(addr: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(addr, field_name, domain)?;

    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be in host:port form, got '{}'", field_name, addr),
        });
    };

    if port.parse::<u16>().is_err() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} has invalid port '{}'", field_name, port),
        });
    }

    if host.is_empty() {
        tracing::debug!("{} binds all interfaces ({})", field_name, addr);
    }

    Ok(())
}

/// Validate a complete configuration object
pub fn validate_config(config: &crate::domains::LoadGenConfig) -> ConfigResult<()> {
    config.validate_all()
}
