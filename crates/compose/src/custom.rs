//! Custom elements rendered alongside fragments

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, ElementContentHandlers, RewriteStrSettings, Selector};
use pokeshop_errors::{Error, TemplateError};
use pokeshop_types::FRAGMENT_TAG;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An element whose content is produced by the host when it is connected
pub trait CustomElement: Send + Sync {
    fn tag(&self) -> &str;

    /// Inner HTML for an instance with `attributes`; `None` keeps the
    /// authored content
    fn connected(&self, attributes: &BTreeMap<String, String>) -> Option<String>;
}

/// Custom elements registered for one page render
#[derive(Clone, Default)]
pub struct CustomElementRegistry {
    elements: Vec<Arc<dyn CustomElement>>,
}

impl fmt::Debug for CustomElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.elements.iter().map(|e| e.tag()))
            .finish()
    }
}

impl CustomElementRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element; a later registration of the same tag replaces
    /// the earlier one
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Rewrite` if the tag is not a valid element
    /// name or is the fragment tag itself.
    pub fn register(&mut self, element: Arc<dyn CustomElement>) -> Result<&mut Self, Error> {
        let tag = element.tag().to_string();
        if tag == FRAGMENT_TAG
            || tag.contains(['.', '#', '[', ' '])
            || tag.parse::<Selector>().is_err()
        {
            return Err(TemplateError::Rewrite {
                message: format!("invalid custom element tag: {tag}"),
            }
            .into());
        }
        self.elements.retain(|existing| existing.tag() != tag);
        self.elements.push(element);
        Ok(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.tag()).collect()
    }

    /// One rewrite handler per registered element
    pub(crate) fn handlers<'s, 'h>(&self) -> Vec<(Cow<'s, Selector>, ElementContentHandlers<'h>)> {
        self.elements
            .iter()
            .map(|custom| {
                let custom = Arc::clone(custom);
                // Tags were validated on registration
                let tag = custom.tag().to_string();
                element!(tag, move |el| {
                    let attributes: BTreeMap<String, String> = el
                        .attributes()
                        .iter()
                        .map(|attr| (attr.name(), attr.value()))
                        .collect();
                    if let Some(html) = custom.connected(&attributes) {
                        el.set_inner_content(&html, ContentType::Html);
                    }
                    Ok(())
                })
            })
            .collect()
    }

    /// Render every registered element found in `html`
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Rewrite` if the markup cannot be processed.
    pub fn apply(&self, html: &str) -> Result<String, Error> {
        if self.is_empty() {
            return Ok(html.to_string());
        }
        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: self.handlers(),
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|e| {
            TemplateError::Rewrite {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting;

    impl CustomElement for Greeting {
        fn tag(&self) -> &str {
            "greeting-component"
        }

        fn connected(&self, attributes: &BTreeMap<String, String>) -> Option<String> {
            Some(format!(
                "<h1>Hello {}</h1>",
                attributes.get("name").map_or("trainer", String::as_str)
            ))
        }
    }

    struct Passive;

    impl CustomElement for Passive {
        fn tag(&self) -> &str {
            "passive-component"
        }

        fn connected(&self, _attributes: &BTreeMap<String, String>) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_apply_renders_registered_elements() {
        let mut registry = CustomElementRegistry::new();
        registry.register(Arc::new(Greeting)).unwrap();
        registry.register(Arc::new(Passive)).unwrap();

        let out = registry
            .apply(r#"<greeting-component name="Ash">x</greeting-component><passive-component>kept</passive-component>"#)
            .unwrap();

        assert_eq!(
            out,
            r#"<greeting-component name="Ash"><h1>Hello Ash</h1></greeting-component><passive-component>kept</passive-component>"#
        );
    }

    #[test]
    fn test_register_rejects_fragment_tag() {
        struct Impostor;
        impl CustomElement for Impostor {
            fn tag(&self) -> &str {
                FRAGMENT_TAG
            }
            fn connected(&self, _: &BTreeMap<String, String>) -> Option<String> {
                None
            }
        }

        let mut registry = CustomElementRegistry::new();
        assert!(registry.register(Arc::new(Impostor)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_same_tag_replaces() {
        let mut registry = CustomElementRegistry::new();
        registry.register(Arc::new(Greeting)).unwrap();
        registry.register(Arc::new(Greeting)).unwrap();
        assert_eq!(registry.tags(), ["greeting-component"]);
    }
}
