//! Fragment resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentError {
    #[error("failed to fetch fragment {url}: {message}")]
    Transport { url: String, message: String },

    #[error("fragment {url} did not answer within {deadline_ms}ms")]
    Timeout { url: String, deadline_ms: u64 },

    #[error("fragment element {id} has no url attribute")]
    MissingUrl { id: String },

    #[error("fragment element {id} has malformed headers: {message}")]
    InvalidHeaders { id: String, message: String },

    #[error("fragment {id} was still pending when the page deadline expired")]
    Abandoned { id: String },
}

impl UserFacingError for FragmentError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => {
                Some("Check that the micro-frontend serving this fragment is up.")
            }
            Self::MissingUrl { .. } => Some("Add a url attribute to the front-end-fragment element."),
            Self::InvalidHeaders { .. } => {
                Some("The headers attribute must be a JSON object of string values.")
            }
            Self::Abandoned { .. } => Some("Raise fragments.render_deadline_ms or fix the slow fragment."),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Abandoned { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Transport { .. } => "fragment.transport",
            Self::Timeout { .. } => "fragment.timeout",
            Self::MissingUrl { .. } => "fragment.missing_url",
            Self::InvalidHeaders { .. } => "fragment.invalid_headers",
            Self::Abandoned { .. } => "fragment.abandoned",
        })
    }
}
