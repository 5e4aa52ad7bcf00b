//! The `front-end-fragment` element and its attach lifecycle

use crate::{script_sources, FragmentHost, FragmentResolver, FRAGMENT_FINISHED_EVENT};
use pokeshop_errors::FragmentError;
use pokeshop_events::{
    AppEvent, EventBus, EventEmitter, EventSender, FragmentEvent, FragmentStatus,
};
use pokeshop_types::{FragmentOptions, FragmentResult, ALREADY_LOADED_ATTR};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one fragment element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentState {
    Pending,
    Loading,
    Resolved,
    Errored,
    /// Left for the browser
    Deferred,
}

/// Completion report of an attached element
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: String,
    pub status: FragmentStatus,
    pub result: Option<FragmentResult>,
}

impl Completion {
    fn new(id: &str, status: FragmentStatus, result: Option<FragmentResult>) -> Self {
        Self {
            id: id.to_string(),
            status,
            result,
        }
    }
}

/// Everything an element needs while attaching
#[derive(Clone)]
pub struct AttachContext {
    pub host: Arc<dyn FragmentHost>,
    pub resolver: Arc<dyn FragmentResolver>,
    pub bus: EventBus,
    pub tx: Option<EventSender>,
}

impl fmt::Debug for AttachContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachContext")
            .field("environment", &self.host.environment())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// A fragment placeholder found in a page
#[derive(Debug, Clone)]
pub struct FragmentElement {
    id: String,
    options: FragmentOptions,
    already_loaded: bool,
    state: FragmentState,
}

impl FragmentElement {
    #[must_use]
    pub fn new(id: impl Into<String>, options: FragmentOptions) -> Self {
        Self {
            id: id.into(),
            options,
            already_loaded: false,
            state: FragmentState::Pending,
        }
    }

    /// Build an element from its attributes
    ///
    /// `headers` must be a JSON object of strings; anything else is
    /// replaced by no headers and reported as a warning. `required` is only
    /// true for the literal value `true`; `async` and `already-loaded` are
    /// presence flags.
    pub fn from_attributes<'a, I>(
        id: impl Into<String>,
        attributes: I,
        tx: &impl EventEmitter,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let id = id.into();
        let mut options = FragmentOptions::new("");
        let mut already_loaded = false;

        for (name, value) in attributes {
            match name {
                "url" => options.url = value.to_string(),
                "headers" => match serde_json::from_str::<BTreeMap<String, String>>(value) {
                    Ok(headers) => options.headers = headers,
                    Err(e) => {
                        let error = FragmentError::InvalidHeaders {
                            id: id.clone(),
                            message: e.to_string(),
                        };
                        tx.emit_warning_with_context(error.to_string(), value);
                    }
                },
                "required" => options.required = value == "true",
                "async" => options.is_async = true,
                ALREADY_LOADED_ATTR => already_loaded = true,
                _ => {}
            }
        }

        Self {
            id,
            options,
            already_loaded,
            state: FragmentState::Pending,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn options(&self) -> &FragmentOptions {
        &self.options
    }

    #[must_use]
    pub fn state(&self) -> FragmentState {
        self.state
    }

    #[must_use]
    pub fn is_already_loaded(&self) -> bool {
        self.already_loaded
    }

    /// Attach the element and drive it to completion
    ///
    /// Never fails: a fetch failure leaves the element `Errored` and is
    /// reported through the resolver's hooks. Every call publishes
    /// `fragment:finished` on the bus. Attaching again after the content
    /// was loaded neither fetches nor re-renders.
    pub async fn attach(&mut self, ctx: &AttachContext) -> Completion {
        let completion = self.run(ctx).await;
        let sources = completion
            .result
            .as_ref()
            .map_or_else(Vec::new, |r| script_sources(&r.html).unwrap_or_default());

        ctx.bus.publish(
            FRAGMENT_FINISHED_EVENT,
            Some(json!({
                "id": completion.id,
                "url": self.options.url,
                "status": completion.status,
                "eventDependencies": completion
                    .result
                    .as_ref()
                    .map(|r| r.event_dependencies.clone())
                    .unwrap_or_default(),
                "scriptSources": sources,
            })),
        );
        completion
    }

    async fn run(&mut self, ctx: &AttachContext) -> Completion {
        if self.already_loaded {
            ctx.tx.emit(AppEvent::Fragment(FragmentEvent::Skipped {
                id: self.id.clone(),
                url: self.options.url.clone(),
            }));
            return Completion::new(
                &self.id,
                FragmentStatus::AlreadyLoaded,
                Some(FragmentResult::default()),
            );
        }

        if ctx.host.defers(self) {
            self.state = FragmentState::Deferred;
            ctx.tx.emit(AppEvent::Fragment(FragmentEvent::Deferred {
                id: self.id.clone(),
                url: self.options.url.clone(),
            }));
            return Completion::new(
                &self.id,
                FragmentStatus::Deferred,
                Some(FragmentResult::default()),
            );
        }

        if self.options.url.trim().is_empty() {
            self.state = FragmentState::Errored;
            ctx.tx.emit_warning(FragmentError::MissingUrl { id: self.id.clone() }.to_string());
            return Completion::new(&self.id, FragmentStatus::Errored, None);
        }

        self.state = FragmentState::Loading;
        let Some(mut result) = ctx.resolver.resolve(&self.options).await else {
            self.state = FragmentState::Errored;
            return Completion::new(&self.id, FragmentStatus::Errored, None);
        };

        match ctx.host.adopt(&result.html) {
            Ok(html) => result.html = html,
            Err(e) => ctx.tx.emit_warning_with_context(
                format!("fragment {} kept as fetched", self.id),
                e.to_string(),
            ),
        }

        self.already_loaded = true;
        self.state = FragmentState::Resolved;
        Completion::new(&self.id, FragmentStatus::Resolved, Some(result))
    }
}
