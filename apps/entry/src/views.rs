//! Shop pages and the per-request render pipeline

use pokeshop_compose::{CompositionService, CustomElementRegistry, Template};
use pokeshop_config::FragmentConfig;
use pokeshop_errors::Error;
use pokeshop_events::EventSender;
use pokeshop_fragment::{HttpFragmentResolver, ResolverHooks};
use pokeshop_metadata::FrontEndMetadata;
use pokeshop_net::NetClient;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, warn};

pub const CATALOG_TEMPLATE: &str = "index.html";
pub const CART_TEMPLATE: &str = "cart.html";

/// A composed document and the required fragments that failed on the way
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub fatal: Vec<String>,
}

impl RenderedPage {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }
}

/// Renders templates with a fresh fragment resolver per page
///
/// Each render gets its own hooks so a failed required fragment only
/// affects the response it belongs to.
#[derive(Clone)]
pub struct PageRenderer {
    client: NetClient,
    fragments: FragmentConfig,
    custom_elements: CustomElementRegistry,
    tx: EventSender,
}

impl PageRenderer {
    pub fn new(
        client: NetClient,
        fragments: FragmentConfig,
        custom_elements: CustomElementRegistry,
        tx: EventSender,
    ) -> Self {
        Self {
            client,
            fragments,
            custom_elements,
            tx,
        }
    }

    /// Compose `template` with `context` against one metadata snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the page markup cannot be processed. Fragment
    /// failures are reported in the result instead.
    pub async fn render(
        &self,
        template: &Template,
        metadata: Arc<FrontEndMetadata>,
        context: &BTreeMap<String, String>,
    ) -> Result<RenderedPage, Error> {
        let fatal = Arc::new(Mutex::new(Vec::new()));
        let fatal_urls = Arc::clone(&fatal);
        let hooks = ResolverHooks::new()
            .on_error(|url, e| warn!(url = %url, error = %e, "it was not possible to fetch {url}"))
            .on_fatal(move |url, e| {
                error!(url = %url, error = %e, "Error: it was not possible to fetch {url}");
                fatal_urls
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(url.to_string());
            });

        let resolver = HttpFragmentResolver::new(self.client.clone())
            .with_dependency_header(self.fragments.dependency_header.clone())
            .with_timeout(self.fragments.timeout())
            .with_hooks(hooks)
            .with_event_sender(self.tx.clone());

        let html = CompositionService::new(Arc::new(resolver), metadata)
            .with_environment(self.fragments.environment)
            .with_custom_elements(self.custom_elements.clone())
            .with_render_deadline(self.fragments.render_deadline())
            .with_event_sender(self.tx.clone())
            .render_template(template, context)
            .await?;

        let fatal = fatal.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(RenderedPage { html, fatal })
    }
}

/// Page templates of the shop
#[derive(Debug, Clone)]
pub struct Views {
    template_dir: PathBuf,
}

impl Views {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    #[must_use]
    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Catalog page `page_number`
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing or cannot be composed.
    pub async fn render_catalog(
        &self,
        renderer: &PageRenderer,
        metadata: Arc<FrontEndMetadata>,
        page_number: u32,
    ) -> Result<RenderedPage, Error> {
        let template = Template::load(&self.template_dir.join(CATALOG_TEMPLATE)).await?;
        let mut context = BTreeMap::new();
        context.insert("currentPageNumber".to_string(), page_number.to_string());
        renderer.render(&template, metadata, &context).await
    }

    /// Cart page
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing or cannot be composed.
    pub async fn render_cart(
        &self,
        renderer: &PageRenderer,
        metadata: Arc<FrontEndMetadata>,
    ) -> Result<RenderedPage, Error> {
        let template = Template::load(&self.template_dir.join(CART_TEMPLATE)).await?;
        renderer.render(&template, metadata, &BTreeMap::new()).await
    }
}
