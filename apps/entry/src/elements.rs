//! Layout elements of the shop pages

use pokeshop_compose::{CustomElement, CustomElementRegistry};
use pokeshop_errors::Error;
use pokeshop_fragment::html::{escape_attr, escape_text};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fixed page header holding the cart counter
///
/// The counter is an `async` fragment, so it is left for the browser.
pub struct HeaderComponent {
    cart_url: String,
}

impl HeaderComponent {
    pub fn new(cart_url: impl Into<String>) -> Self {
        Self {
            cart_url: cart_url.into(),
        }
    }
}

impl CustomElement for HeaderComponent {
    fn tag(&self) -> &str {
        "header-component"
    }

    fn connected(&self, _attributes: &BTreeMap<String, String>) -> Option<String> {
        Some(format!(
            r#"<style>
#main-header {{ background: #544F73; position: fixed; top: 0; left: 0; width: 100%; height: 60px; display: flex; align-items: center; justify-content: space-between; padding: 0 60px; box-sizing: border-box; z-index: 1; }}
#main-header h1 {{ color: white; font-family: sans-serif; margin: 0; font-size: 22px; }}
@media only screen and (max-width: 600px) {{ #main-header h1 {{ font-size: 16px; }} #main-header {{ padding: 0 20px; }} }}
</style>
<header id="main-header"><h1>Pokémon Shop!</h1><div id="cart-container"><front-end-fragment async="true" id="cart-counter-fragment" url="{}"></front-end-fragment></div></header>"#,
            escape_attr(&self.cart_url)
        ))
    }
}

/// Section title taken from the `text` attribute
pub struct TitleComponent;

impl CustomElement for TitleComponent {
    fn tag(&self) -> &str {
        "title-component"
    }

    fn connected(&self, attributes: &BTreeMap<String, String>) -> Option<String> {
        let text = attributes.get("text").map(String::as_str).unwrap_or_default();
        Some(format!(
            r#"<style>.title-component {{ font-family: sans-serif; padding: 10px 0; color: #A67B92; display: inline-block; }} .title-component h1 {{ font-size: 1.5em; }}</style><header class="title-component"><h1>{}</h1></header>"#,
            escape_text(text)
        ))
    }
}

/// Fallback shown in the `fragment-error` slot
pub struct FragmentErrorComponent;

impl CustomElement for FragmentErrorComponent {
    fn tag(&self) -> &str {
        "fragment-error-component"
    }

    fn connected(&self, _attributes: &BTreeMap<String, String>) -> Option<String> {
        Some(
            r#"<style>.fragment-error-component { color: #9d646d; font-family: sans-serif; border: 1px solid #66212c; box-shadow: 5px 5px #66212c; border-radius: 20px; padding: 20px; }</style><div class="fragment-error-component">🛑️ An error has occurred!</div>"#
                .to_string(),
        )
    }
}

/// Elements registered on every shop page
///
/// # Errors
///
/// Returns an error if an element tag is rejected by the registry.
pub fn shop_elements(cart_url: &str) -> Result<CustomElementRegistry, Error> {
    let mut registry = CustomElementRegistry::new();
    registry
        .register(Arc::new(HeaderComponent::new(cart_url)))?
        .register(Arc::new(TitleComponent))?
        .register(Arc::new(FragmentErrorComponent))?;
    Ok(registry)
}
