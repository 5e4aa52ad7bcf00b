//! Render environments a fragment element can be attached in

use crate::html::escape_attr;
use crate::FragmentElement;
use lol_html::html_content::ContentType;
use lol_html::{end, element, rewrite_str, text, RewriteStrSettings};
use pokeshop_errors::{Error, TemplateError};
use pokeshop_types::{RenderEnvironment, DYNAMIC_SCRIPT_ATTR};
use std::cell::RefCell;
use std::sync::Arc;

/// Environment-specific part of attaching a fragment element
pub trait FragmentHost: Send + Sync {
    fn environment(&self) -> RenderEnvironment;

    /// Whether the element is left unresolved for a later environment
    fn defers(&self, element: &FragmentElement) -> bool;

    /// Turn fetched fragment HTML into the content placed in the element
    ///
    /// # Errors
    ///
    /// Returns an error if the HTML cannot be rewritten.
    fn adopt(&self, html: &str) -> Result<String, Error>;
}

/// Server-side rendering: `async` fragments are left for the browser and
/// injected markup is kept as fetched
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerHost;

impl FragmentHost for ServerHost {
    fn environment(&self) -> RenderEnvironment {
        RenderEnvironment::Server
    }

    fn defers(&self, element: &FragmentElement) -> bool {
        element.options().is_async
    }

    fn adopt(&self, html: &str) -> Result<String, Error> {
        Ok(html.to_string())
    }
}

/// Browser rendering: every fragment is resolved and scripts are
/// re-created so they run once inserted
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl FragmentHost for BrowserHost {
    fn environment(&self) -> RenderEnvironment {
        RenderEnvironment::Browser
    }

    fn defers(&self, _element: &FragmentElement) -> bool {
        false
    }

    fn adopt(&self, html: &str) -> Result<String, Error> {
        recreate_scripts(html)
    }
}

/// Host matching a configured environment
#[must_use]
pub fn host_for(environment: RenderEnvironment) -> Arc<dyn FragmentHost> {
    match environment {
        RenderEnvironment::Server => Arc::new(ServerHost),
        RenderEnvironment::Browser => Arc::new(BrowserHost),
    }
}

#[derive(Debug, Default)]
struct ScriptCopy {
    attributes: Vec<(String, String)>,
    text: String,
}

impl ScriptCopy {
    fn render(&self) -> String {
        let mut out = String::from("<script");
        for (name, value) in &self.attributes {
            if name == DYNAMIC_SCRIPT_ATTR {
                continue;
            }
            out.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
        }
        out.push_str(&format!(r#" {DYNAMIC_SCRIPT_ATTR}="true">"#));
        out.push_str(&self.text);
        out.push_str("</script>");
        out
    }
}

/// Detach every `<script>` of `html` and append a fresh copy of each,
/// attributes and text included, at the end
///
/// # Errors
///
/// Returns `TemplateError::Rewrite` if the markup cannot be processed.
pub fn recreate_scripts(html: &str) -> Result<String, Error> {
    let scripts = RefCell::new(Vec::<ScriptCopy>::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    scripts.borrow_mut().push(ScriptCopy {
                        attributes: el
                            .attributes()
                            .iter()
                            .map(|attr| (attr.name(), attr.value()))
                            .collect(),
                        text: String::new(),
                    });
                    Ok(())
                }),
                text!("script", |chunk| {
                    if let Some(script) = scripts.borrow_mut().last_mut() {
                        script.text.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(rewrite_error)?;

    let scripts = scripts.into_inner();
    if scripts.is_empty() {
        return Ok(html.to_string());
    }
    let fresh: String = scripts.iter().map(ScriptCopy::render).collect();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("script", |el| {
                el.remove();
                Ok(())
            })],
            document_content_handlers: vec![end!(|end| {
                end.append(&fresh, ContentType::Html);
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(rewrite_error)
}

/// `src` of every `<script>` in `html`, in document order
///
/// # Errors
///
/// Returns `TemplateError::Rewrite` if the markup cannot be processed.
pub fn script_sources(html: &str) -> Result<Vec<String>, Error> {
    let mut sources = Vec::new();
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("script[src]", |el| {
                if let Some(src) = el.get_attribute("src") {
                    sources.push(src);
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(rewrite_error)?;
    Ok(sources)
}

fn rewrite_error(e: impl std::fmt::Display) -> Error {
    TemplateError::Rewrite {
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokeshop_types::FragmentOptions;

    #[test]
    fn test_scripts_are_recreated_at_the_end() {
        let html = r#"<div><script src="/cart.js" defer></script><p>cart</p><script>window.count = 1;</script></div>"#;
        let out = recreate_scripts(html).unwrap();

        assert_eq!(
            out,
            r#"<div><p>cart</p></div><script src="/cart.js" defer="" data-dynamic-loaded="true"></script><script data-dynamic-loaded="true">window.count = 1;</script>"#
        );
    }

    #[test]
    fn test_script_sources_in_document_order() {
        let html = r#"<ul></ul><script src="/cart.js"></script><script>inline()</script><script src="/checkout.js"></script>"#;
        assert_eq!(script_sources(html).unwrap(), ["/cart.js", "/checkout.js"]);
        assert!(script_sources("<p>no scripts</p>").unwrap().is_empty());
    }

    #[test]
    fn test_html_without_scripts_is_unchanged() {
        let html = "<ul><li>Pikachu</li></ul>";
        assert_eq!(recreate_scripts(html).unwrap(), html);
    }

    #[test]
    fn test_server_defers_only_async() {
        let host = ServerHost;
        let eager = FragmentElement::new("a", FragmentOptions::new("http://a/"));
        let lazy = FragmentElement::new("b", FragmentOptions::new("http://b/").asynchronous(true));

        assert!(!host.defers(&eager));
        assert!(host.defers(&lazy));
        assert!(!BrowserHost.defers(&lazy));
    }

    #[test]
    fn test_host_for_environment() {
        assert_eq!(
            host_for(RenderEnvironment::Browser).environment(),
            RenderEnvironment::Browser
        );
        assert_eq!(
            host_for(RenderEnvironment::Server).environment(),
            RenderEnvironment::Server
        );
    }
}
