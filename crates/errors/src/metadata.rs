//! Front-end metadata error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetadataError {
    #[error("metadata source {url} is unreachable: {message}")]
    SourceUnreachable { url: String, message: String },

    #[error("metadata source {url} returned an invalid document: {message}")]
    InvalidDocument { url: String, message: String },

    #[error("embedded metadata script not found in document")]
    MissingEmbeddedScript,

    #[error("embedded metadata script is invalid: {message}")]
    InvalidEmbeddedScript { message: String },
}

impl UserFacingError for MetadataError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::SourceUnreachable { .. } => {
                Some("Check metadata.sources; each origin must serve GET /metadata.")
            }
            Self::InvalidDocument { .. } => {
                Some("A metadata document needs an eventsProvider array.")
            }
            Self::MissingEmbeddedScript | Self::InvalidEmbeddedScript { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnreachable { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::SourceUnreachable { .. } => "metadata.unreachable",
            Self::InvalidDocument { .. } => "metadata.invalid_document",
            Self::MissingEmbeddedScript => "metadata.missing_script",
            Self::InvalidEmbeddedScript { .. } => "metadata.invalid_script",
        })
    }
}
