//! Reading and rewriting the page document
//!
//! Composition takes two passes over the markup. The scan records every
//! fragment element and script source without changing anything; the
//! rewrite places fragment content, renders custom elements and appends
//! the page scripts. Both passes visit fragment elements in document
//! order, so the n-th element of the rewrite is the n-th of the scan.

use crate::CustomElementRegistry;
use lol_html::html_content::ContentType;
use lol_html::{end, element, rewrite_str, RewriteStrSettings};
use pokeshop_errors::{Error, TemplateError};
use pokeshop_types::{ALREADY_LOADED_ATTR, FRAGMENT_TAG};
use std::collections::{HashMap, HashSet};

/// Declarative shadow root exposing the author's `fragment-error` slot
pub const FALLBACK_SHADOW_ROOT: &str =
    r#"<template shadowrootmode="open"><slot name="fragment-error"></slot></template>"#;

/// A fragment element found by the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFragment {
    pub id: String,
    pub attributes: Vec<(String, String)>,
}

impl ScannedFragment {
    #[must_use]
    pub fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// What the scan learned about a page
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub fragments: Vec<ScannedFragment>,
    pub script_sources: Vec<String>,
    pub has_body: bool,
}

/// How a fragment element is written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// Replace the content and mark the element loaded
    Resolved(String),
    /// Keep the content and expose the fallback slot
    Errored,
    /// Leave the element as authored
    Untouched,
}

fn rewrite_error(e: impl std::fmt::Display) -> Error {
    TemplateError::Rewrite {
        message: e.to_string(),
    }
    .into()
}

/// Identifier used for the fragment at `index` when it has no usable `id`
#[must_use]
pub fn positional_id(index: usize) -> String {
    format!("{FRAGMENT_TAG}-{index}")
}

/// Collect fragments, script sources and whether the page has a body
///
/// Fragment ids come from the `id` attribute; a missing, empty or
/// repeated id is replaced by the positional identifier.
///
/// # Errors
///
/// Returns `TemplateError::Rewrite` if the markup cannot be processed.
pub fn scan(html: &str) -> Result<PageScan, Error> {
    let mut fragments = Vec::new();
    let mut script_sources = Vec::new();
    let mut has_body = false;
    let mut seen_ids = HashSet::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(FRAGMENT_TAG, |el| {
                    let index = fragments.len();
                    let id = el
                        .get_attribute("id")
                        .filter(|id| !id.trim().is_empty() && !seen_ids.contains(id))
                        .unwrap_or_else(|| positional_id(index));
                    seen_ids.insert(id.clone());
                    fragments.push(ScannedFragment {
                        id,
                        attributes: el
                            .attributes()
                            .iter()
                            .map(|attr| (attr.name(), attr.value()))
                            .collect(),
                    });
                    Ok(())
                }),
                element!("script[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        script_sources.push(src);
                    }
                    Ok(())
                }),
                element!("body", |_el| {
                    has_body = true;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(rewrite_error)?;

    Ok(PageScan {
        fragments,
        script_sources,
        has_body,
    })
}

/// Write fragment outcomes, custom elements and the trailing scripts
///
/// `tail` is appended at the end of `<body>`, or at the end of the
/// document when the page has no body.
///
/// # Errors
///
/// Returns `TemplateError::Rewrite` if the markup cannot be processed.
pub fn rewrite(
    html: &str,
    scan: &PageScan,
    outcomes: &HashMap<String, FragmentOutcome>,
    custom_elements: &CustomElementRegistry,
    tail: &str,
) -> Result<String, Error> {
    let mut index = 0;
    let mut handlers = vec![element!(FRAGMENT_TAG, |el| {
        let outcome = scan
            .fragments
            .get(index)
            .and_then(|fragment| outcomes.get(&fragment.id));
        index += 1;

        match outcome {
            Some(FragmentOutcome::Resolved(content)) => {
                el.set_inner_content(content, ContentType::Html);
                el.set_attribute(ALREADY_LOADED_ATTR, "true")?;
            }
            Some(FragmentOutcome::Errored) => {
                el.prepend(FALLBACK_SHADOW_ROOT, ContentType::Html);
            }
            Some(FragmentOutcome::Untouched) | None => {}
        }
        Ok(())
    })];
    handlers.extend(custom_elements.handlers());

    let mut document_handlers = Vec::new();
    if scan.has_body {
        handlers.push(element!("body", |el| {
            el.append(tail, ContentType::Html);
            Ok(())
        }));
    } else {
        document_handlers.push(end!(|end| {
            end.append(tail, ContentType::Html);
            Ok(())
        }));
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            document_content_handlers: document_handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(rewrite_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokeshop_types::FRAGMENT_ERROR_SLOT;

    const PAGE: &str = r#"<html><head><script src="/main.js"></script></head><body><front-end-fragment id="catalog" url="http://localhost:3000/catalog/page/1" required="true"></front-end-fragment><front-end-fragment url="http://localhost:3001/" async></front-end-fragment></body></html>"#;

    #[test]
    fn test_fallback_names_error_slot() {
        assert!(FALLBACK_SHADOW_ROOT.contains(&format!(r#"name="{FRAGMENT_ERROR_SLOT}""#)));
    }

    #[test]
    fn test_scan() {
        let scan = scan(PAGE).unwrap();

        assert!(scan.has_body);
        assert_eq!(scan.script_sources, vec!["/main.js"]);
        assert_eq!(scan.fragments.len(), 2);
        assert_eq!(scan.fragments[0].id, "catalog");
        assert_eq!(scan.fragments[1].id, "front-end-fragment-1");
        assert!(scan.fragments[1]
            .attribute_pairs()
            .any(|(name, _)| name == "async"));
    }

    #[test]
    fn test_repeated_id_gets_positional_id() {
        let scan = scan(r#"<front-end-fragment id="x"></front-end-fragment><front-end-fragment id="x"></front-end-fragment>"#).unwrap();
        assert_eq!(scan.fragments[0].id, "x");
        assert_eq!(scan.fragments[1].id, "front-end-fragment-1");
        assert!(!scan.has_body);
    }

    #[test]
    fn test_rewrite_outcomes() {
        let scan = scan(PAGE).unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert("catalog".to_string(), FragmentOutcome::Resolved("<ul><li>Bulbasaur</li></ul>".into()));
        outcomes.insert("front-end-fragment-1".to_string(), FragmentOutcome::Untouched);

        let out = rewrite(PAGE, &scan, &outcomes, &CustomElementRegistry::new(), "<!--tail-->").unwrap();

        assert!(out.contains(r#"required="true" already-loaded="true"><ul><li>Bulbasaur</li></ul></front-end-fragment>"#));
        assert!(out.contains(r#"<front-end-fragment url="http://localhost:3001/" async></front-end-fragment>"#));
        assert!(out.ends_with("<!--tail--></body></html>"));
    }

    #[test]
    fn test_rewrite_errored_keeps_author_fallback() {
        let html = r#"<front-end-fragment id="cart" url="http://x/"><p slot="fragment-error">Cart unavailable</p></front-end-fragment>"#;
        let scan = scan(html).unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert("cart".to_string(), FragmentOutcome::Errored);

        let out = rewrite(html, &scan, &outcomes, &CustomElementRegistry::new(), "<!--tail-->").unwrap();

        assert_eq!(
            out,
            format!(r#"<front-end-fragment id="cart" url="http://x/">{FALLBACK_SHADOW_ROOT}<p slot="fragment-error">Cart unavailable</p></front-end-fragment><!--tail-->"#)
        );
    }
}
