//! Structured logging integration for events
//!
//! Libraries report through `AppEvent`s; this module turns each one into a
//! tracing record with structured fields.

use pokeshop_events::{
    AppEvent, CompositionEvent, EventMessage, FragmentEvent, GeneralEvent, MetadataEvent,
};
use tracing::{debug, error, info, trace, warn, Level};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
#[allow(clippy::too_many_lines)]
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Fragment(fragment_event) => match fragment_event {
            FragmentEvent::Started { url, required } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    url = %url,
                    required = required,
                    "Fragment fetch started"
                );
            }
            FragmentEvent::Resolved {
                url,
                status,
                bytes,
                event_dependencies,
                duration,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    url = %url,
                    status = status,
                    bytes = bytes,
                    event_dependencies = ?event_dependencies,
                    duration_ms = duration.as_millis(),
                    "Fragment resolved"
                );
            }
            FragmentEvent::Failed {
                url,
                required,
                failure,
            } => {
                if *required {
                    error!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation_id,
                        url = %url,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Required fragment failed"
                    );
                } else {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation_id,
                        url = %url,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        "Fragment failed"
                    );
                }
            }
            FragmentEvent::Deferred { id, url } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    id = %id,
                    url = %url,
                    "Fragment deferred to the browser"
                );
            }
            FragmentEvent::Skipped { id, url } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    id = %id,
                    url = %url,
                    "Fragment already loaded"
                );
            }
        },

        AppEvent::Metadata(metadata_event) => match metadata_event {
            MetadataEvent::SourceLoaded { url, providers } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    url = %url,
                    providers = providers,
                    "Metadata source loaded"
                );
            }
            MetadataEvent::SourceFailed { url, failure } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    url = %url,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Metadata source failed"
                );
            }
            MetadataEvent::Registered {
                sources,
                failed_sources,
                events,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    sources = sources,
                    failed_sources = failed_sources,
                    events = events,
                    "Front-end metadata registered"
                );
            }
            MetadataEvent::Refreshed { events } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    events = events,
                    "Front-end metadata refreshed"
                );
            }
        },

        AppEvent::Composition(composition_event) => match composition_event {
            CompositionEvent::Started { fragments } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    fragments = fragments,
                    "Composition started"
                );
            }
            CompositionEvent::FragmentFinished {
                id,
                status,
                remaining,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    id = %id,
                    status = ?status,
                    remaining = remaining,
                    "Fragment finished"
                );
            }
            CompositionEvent::DependencyMissing { event } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    event = %event,
                    "There are no event listener for \"{event}\""
                );
            }
            CompositionEvent::DependencyInjected {
                event,
                service_file,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    event = %event,
                    service_file = %service_file,
                    "Dependency script injected"
                );
            }
            CompositionEvent::DeadlineExceeded { pending, deadline } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    pending = ?pending,
                    deadline_ms = deadline.as_millis(),
                    "Render deadline exceeded"
                );
            }
            CompositionEvent::Completed {
                fragments,
                duration,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    fragments = fragments,
                    duration_ms = duration.as_millis(),
                    "Page composed"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::Error { message } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    "{message}"
                );
            }
            GeneralEvent::DebugLog { message } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    "{message}"
                );
            }
            other => match meta.tracing_level() {
                Level::ERROR => error!(source = meta.source.as_str(), event = ?other),
                Level::WARN => warn!(source = meta.source.as_str(), event = ?other),
                Level::INFO => info!(source = meta.source.as_str(), event = ?other),
                Level::DEBUG => debug!(source = meta.source.as_str(), event = ?other),
                Level::TRACE => trace!(source = meta.source.as_str(), event = ?other),
            },
        },
    }
}

/// Initialize tracing
///
/// `RUST_LOG` takes precedence over the built-in filters. Logs go to
/// stderr so rendered documents on stdout stay clean.
pub fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,pokeshop_entry=debug,tower_http=debug"
    } else {
        "info,tower_http=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
