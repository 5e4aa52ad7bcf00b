//! Fetching fragment HTML from micro-frontends

use async_trait::async_trait;
use pokeshop_errors::{Error, FragmentError};
use pokeshop_events::{AppEvent, EventEmitter, EventSender, FailureContext, FragmentEvent};
use pokeshop_net::NetClient;
use pokeshop_types::{FragmentOptions, FragmentResult, EVENT_DEPENDENCY_HEADER};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback receiving the url and error of a failed fetch
pub type FailureHook = Arc<dyn Fn(&str, &Error) + Send + Sync>;

/// Failure callbacks of a resolver
///
/// `on_fatal` sees failures of required fragments, `on_error` every other
/// failure. Both default to doing nothing.
#[derive(Clone)]
pub struct ResolverHooks {
    on_fatal: FailureHook,
    on_error: FailureHook,
}

impl Default for ResolverHooks {
    fn default() -> Self {
        Self {
            on_fatal: Arc::new(|_, _| {}),
            on_error: Arc::new(|_, _| {}),
        }
    }
}

impl fmt::Debug for ResolverHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverHooks").finish_non_exhaustive()
    }
}

impl ResolverHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_fatal<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Error) + Send + Sync + 'static,
    {
        self.on_fatal = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Error) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(hook);
        self
    }

    /// Route a failure to the hook matching the fragment's `required` flag
    pub fn report(&self, required: bool, url: &str, error: &Error) {
        if required {
            (self.on_fatal)(url, error);
        } else {
            (self.on_error)(url, error);
        }
    }
}

/// Source of fragment HTML
///
/// Failures are never returned: implementations report them through their
/// hooks and answer `None`.
#[async_trait]
pub trait FragmentResolver: Send + Sync {
    async fn resolve(&self, options: &FragmentOptions) -> Option<FragmentResult>;

    /// Report a fragment the caller gave up on before `resolve` finished
    fn report_failure(&self, _options: &FragmentOptions, _error: &Error) {}
}

/// Resolver performing `GET <url>` over HTTP
///
/// Any response counts as a result whatever its status; only transport
/// failures and the per-fragment deadline are errors.
pub struct HttpFragmentResolver {
    client: NetClient,
    dependency_header: String,
    timeout: Option<Duration>,
    hooks: ResolverHooks,
    tx: Option<EventSender>,
}

impl fmt::Debug for HttpFragmentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFragmentResolver")
            .field("dependency_header", &self.dependency_header)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpFragmentResolver {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self {
            client,
            dependency_header: EVENT_DEPENDENCY_HEADER.to_string(),
            timeout: None,
            hooks: ResolverHooks::default(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_dependency_header(mut self, header: impl Into<String>) -> Self {
        self.dependency_header = header.into();
        self
    }

    /// Per-fragment deadline; `None` waits as long as the client does
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: ResolverHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    async fn fetch(&self, options: &FragmentOptions) -> Result<(u16, FragmentResult), Error> {
        let transport = |e: &dyn fmt::Display| FragmentError::Transport {
            url: options.url.clone(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get_with_headers(&options.url, &options.headers)
            .await
            .map_err(|e| transport(&e))?;

        let status = response.status().as_u16();
        let dependencies = FragmentResult::parse_event_dependencies(
            response
                .headers()
                .get(self.dependency_header.as_str())
                .and_then(|value| value.to_str().ok()),
        );
        let html = response.text().await.map_err(|e| transport(&e))?;

        Ok((status, FragmentResult::new(html, dependencies)))
    }

    async fn fetch_with_deadline(
        &self,
        options: &FragmentOptions,
    ) -> Result<(u16, FragmentResult), Error> {
        let Some(deadline) = self.timeout else {
            return self.fetch(options).await;
        };
        tokio::time::timeout(deadline, self.fetch(options))
            .await
            .map_err(|_| FragmentError::Timeout {
                url: options.url.clone(),
                deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}

#[async_trait]
impl FragmentResolver for HttpFragmentResolver {
    async fn resolve(&self, options: &FragmentOptions) -> Option<FragmentResult> {
        self.tx.emit(AppEvent::Fragment(FragmentEvent::Started {
            url: options.url.clone(),
            required: options.required,
        }));
        let start = Instant::now();

        match self.fetch_with_deadline(options).await {
            Ok((status, result)) => {
                self.tx.emit(AppEvent::Fragment(FragmentEvent::Resolved {
                    url: options.url.clone(),
                    status,
                    bytes: result.html.len(),
                    event_dependencies: result.event_dependencies.clone(),
                    duration: start.elapsed(),
                }));
                Some(result)
            }
            Err(e) => {
                self.report_failure(options, &e);
                None
            }
        }
    }

    fn report_failure(&self, options: &FragmentOptions, error: &Error) {
        self.tx.emit(AppEvent::Fragment(FragmentEvent::Failed {
            url: options.url.clone(),
            required: options.required,
            failure: FailureContext::from_error(error),
        }));
        self.hooks.report(options.required, &options.url, error);
    }
}
