use serde::{Deserialize, Serialize};

use crate::EventSource;
use pokeshop_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod composition;
pub mod fragment;
pub mod general;
pub mod metadata;

pub use composition::*;
pub use fragment::*;
pub use general::*;
pub use metadata::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Fragment fetches against micro-frontends
    Fragment(FragmentEvent),

    /// Front-end metadata registration
    Metadata(MetadataEvent),

    /// Page composition and dependency injection
    Composition(CompositionEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Fragment(_) => EventSource::FRAGMENT,
            Self::Metadata(_) => EventSource::METADATA,
            Self::Composition(_) => EventSource::COMPOSITION,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. })
            | Self::Composition(CompositionEvent::DependencyMissing { .. }) => Level::ERROR,

            Self::Fragment(FragmentEvent::Failed { required, .. }) => {
                if *required {
                    Level::ERROR
                } else {
                    Level::WARN
                }
            }

            Self::General(GeneralEvent::Warning { .. })
            | Self::Metadata(MetadataEvent::SourceFailed { .. })
            | Self::Composition(CompositionEvent::DeadlineExceeded { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Fragment(
                FragmentEvent::Started { .. }
                | FragmentEvent::Deferred { .. }
                | FragmentEvent::Skipped { .. },
            )
            | Self::Composition(
                CompositionEvent::FragmentFinished { .. }
                | CompositionEvent::DependencyInjected { .. },
            ) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "pokeshop::events::general",
            Self::Fragment(_) => "pokeshop::events::fragment",
            Self::Metadata(_) => "pokeshop::events::metadata",
            Self::Composition(_) => "pokeshop::events::composition",
        }
    }
}
