//! Template and page composition error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplateError {
    #[error("template not found: {path}")]
    NotFound { path: String },

    #[error("failed to rewrite document: {message}")]
    Rewrite { message: String },
}

impl UserFacingError for TemplateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Check server.template_dir in the configuration."),
            Self::Rewrite { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "template.not_found",
            Self::Rewrite { .. } => "template.rewrite",
        })
    }
}
