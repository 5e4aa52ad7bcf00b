//! CLI error handling

use std::fmt;

use pokeshop_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Library error
    App(pokeshop_errors::Error),
    /// A required fragment could not be fetched
    FatalFragment(Vec<String>),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::App(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::FatalFragment(urls) => {
                write!(f, "required fragments failed: {}", urls.join(", "))
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<pokeshop_errors::Error> for CliError {
    fn from(e: pokeshop_errors::Error) -> Self {
        CliError::App(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokeshop_errors::{ConfigError, TemplateError};

    #[test]
    fn test_display_includes_hint() {
        let err = CliError::from(pokeshop_errors::Error::from(TemplateError::NotFound {
            path: "templates/index.html".to_string(),
        }));
        let rendered = err.to_string();
        assert!(rendered.contains("templates/index.html"));
    }

    #[test]
    fn test_config_error_is_app_error() {
        let err = CliError::from(pokeshop_errors::Error::from(ConfigError::InvalidValue {
            field: "POKESHOP_ENVIRONMENT".to_string(),
            value: "mars".to_string(),
        }));
        assert!(matches!(err, CliError::App(_)));
        assert!(err.to_string().contains("POKESHOP_ENVIRONMENT"));
    }

    #[test]
    fn test_fatal_fragment_lists_urls() {
        let err = CliError::FatalFragment(vec!["http://localhost:3001/".to_string()]);
        assert_eq!(
            err.to_string(),
            "required fragments failed: http://localhost:3001/"
        );
    }
}
