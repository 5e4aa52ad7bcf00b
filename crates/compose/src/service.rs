//! Page composition: resolve every fragment of a page and serialize it

use crate::page::{rewrite, scan, FragmentOutcome};
use crate::{CustomElementRegistry, Template, WaitSet};
use pokeshop_errors::{Error, FragmentError};
use pokeshop_events::{
    AppEvent, CompositionEvent, EventBus, EventEmitter, EventSender, FragmentStatus,
};
use pokeshop_fragment::{
    host_for, AttachContext, Completion, DependencyInjector, FragmentElement, FragmentHost,
    FragmentResolver, ServerHost,
};
use pokeshop_metadata::FrontEndMetadata;
use pokeshop_types::{FragmentOptions, RenderEnvironment};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Composes pages from templates and fragments
///
/// One service can render many pages concurrently; every render owns its
/// document, wait-set, bus and injected scripts.
#[derive(Clone)]
pub struct CompositionService {
    resolver: Arc<dyn FragmentResolver>,
    host: Arc<dyn FragmentHost>,
    metadata: Arc<FrontEndMetadata>,
    custom_elements: CustomElementRegistry,
    render_deadline: Option<Duration>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for CompositionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionService")
            .field("environment", &self.host.environment())
            .field("events", &self.metadata.len())
            .field("custom_elements", &self.custom_elements)
            .field("render_deadline", &self.render_deadline)
            .finish_non_exhaustive()
    }
}

impl CompositionService {
    /// Server-side service without custom elements or deadline
    #[must_use]
    pub fn new(resolver: Arc<dyn FragmentResolver>, metadata: Arc<FrontEndMetadata>) -> Self {
        Self {
            resolver,
            host: Arc::new(ServerHost),
            metadata,
            custom_elements: CustomElementRegistry::default(),
            render_deadline: None,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: RenderEnvironment) -> Self {
        self.host = host_for(environment);
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn FragmentHost>) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_custom_elements(mut self, custom_elements: CustomElementRegistry) -> Self {
        self.custom_elements = custom_elements;
        self
    }

    /// Stop waiting for fragments after `deadline`; `None` waits for all
    #[must_use]
    pub fn with_render_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.render_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Substitute `context` into `template` and compose the result
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Rewrite` if the page markup cannot be
    /// processed. Fragment failures never fail the render.
    pub async fn render_template(
        &self,
        template: &Template,
        context: &BTreeMap<String, String>,
    ) -> Result<String, Error> {
        self.compose(&template.substitute(context)).await
    }

    /// Resolve every fragment of `html` and return the final document
    ///
    /// The wait-set is the set of fragments present in `html`; the render
    /// returns once each of them has completed, or when the deadline
    /// expires, in which case the stragglers are cancelled, reported to the
    /// resolver as failed and rendered with their fallback. The metadata
    /// script and any dependency scripts are appended to the body. Events
    /// of one call share a fresh render id as their correlation id.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Rewrite` if the page markup cannot be
    /// processed.
    pub async fn compose(&self, html: &str) -> Result<String, Error> {
        let start = Instant::now();
        let render_id = Uuid::new_v4().to_string();
        let page = scan(html)?;
        let fragments = page.fragments.len();

        self.tx.emit_correlated(
            &render_id,
            AppEvent::Composition(CompositionEvent::Started { fragments }),
        );

        let injector = Arc::new(Mutex::new(
            DependencyInjector::new(Arc::clone(&self.metadata))
                .with_existing_scripts(page.script_sources.iter().cloned())
                .with_event_sender(self.tx.clone()),
        ));
        let bus = EventBus::new();
        let subscription = DependencyInjector::listen(&injector, &bus);

        let ctx = AttachContext {
            host: Arc::clone(&self.host),
            resolver: Arc::clone(&self.resolver),
            bus,
            tx: self.tx.clone(),
        };

        let mut wait = WaitSet::new(page.fragments.iter().map(|f| f.id.clone()));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut tasks = JoinSet::new();
        let mut requests: HashMap<String, FragmentOptions> = HashMap::with_capacity(fragments);

        for fragment in &page.fragments {
            let mut element = FragmentElement::from_attributes(
                fragment.id.clone(),
                fragment.attribute_pairs(),
                &self.tx,
            );
            requests.insert(fragment.id.clone(), element.options().clone());
            let ctx = ctx.clone();
            let done = done_tx.clone();
            tasks.spawn(async move {
                let completion = element.attach(&ctx).await;
                // Receiver is gone once the render gave up on this fragment
                let _ = done.send(completion);
            });
        }
        drop(done_tx);

        let mut outcomes = HashMap::with_capacity(fragments);
        let deadline = self.render_deadline.map(|d| tokio::time::Instant::now() + d);

        while !wait.is_empty() {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, done_rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => done_rx.recv().await,
            };
            // Every sender gone means every task has ended
            let Some(completion) = next else { break };

            if !wait.complete(&completion.id) {
                continue;
            }
            self.tx.emit_correlated(
                &render_id,
                AppEvent::Composition(CompositionEvent::FragmentFinished {
                    id: completion.id.clone(),
                    status: completion.status,
                    remaining: wait.remaining(),
                }),
            );
            outcomes.insert(completion.id.clone(), self.outcome_of(completion));
        }

        if !wait.is_empty() {
            tasks.abort_all();
            let pending = wait.pending();
            self.tx.emit_correlated(
                &render_id,
                AppEvent::Composition(CompositionEvent::DeadlineExceeded {
                    pending: pending.clone(),
                    deadline: self.render_deadline.unwrap_or_default(),
                }),
            );
            for id in pending {
                if let Some(options) = requests.get(&id) {
                    let error = Error::from(FragmentError::Abandoned { id: id.clone() });
                    self.resolver.report_failure(options, &error);
                }
                outcomes.insert(id, FragmentOutcome::Errored);
            }
        }
        subscription.unsubscribe();

        let tail = {
            let injector = injector.lock().unwrap_or_else(PoisonError::into_inner);
            format!("{}{}", self.metadata.to_script(), injector.render_scripts())
        };
        let document = rewrite(html, &page, &outcomes, &self.custom_elements, &tail)?;

        self.tx.emit_correlated(
            &render_id,
            AppEvent::Composition(CompositionEvent::Completed {
                fragments,
                duration: start.elapsed(),
            }),
        );
        Ok(document)
    }

    fn outcome_of(&self, completion: Completion) -> FragmentOutcome {
        match (completion.status, completion.result) {
            (FragmentStatus::Resolved, Some(result)) => {
                match self.custom_elements.apply(&result.html) {
                    Ok(html) => FragmentOutcome::Resolved(html),
                    Err(e) => {
                        self.tx.emit_warning_with_context(
                            format!("custom elements skipped in fragment {}", completion.id),
                            e.to_string(),
                        );
                        FragmentOutcome::Resolved(result.html)
                    }
                }
            }
            (FragmentStatus::Errored, _) | (FragmentStatus::Resolved, None) => {
                FragmentOutcome::Errored
            }
            (FragmentStatus::Deferred | FragmentStatus::AlreadyLoaded, _) => {
                FragmentOutcome::Untouched
            }
        }
    }
}

/// Compose `template` on the server with `context` substituted
///
/// # Errors
///
/// Returns `TemplateError::Rewrite` if the page markup cannot be processed.
pub async fn render(
    template: &Template,
    resolver: Arc<dyn FragmentResolver>,
    metadata: Arc<FrontEndMetadata>,
    context: &BTreeMap<String, String>,
    custom_elements: CustomElementRegistry,
) -> Result<String, Error> {
    CompositionService::new(resolver, metadata)
        .with_custom_elements(custom_elements)
        .render_template(template, context)
        .await
}
