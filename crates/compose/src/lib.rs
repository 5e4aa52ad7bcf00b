#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Page composition for pokeshop
//!
//! Turns a page template into a finished document: placeholders are
//! substituted, every `front-end-fragment` is resolved concurrently, custom
//! elements are rendered and the scripts the page needs are appended.

mod custom;
pub mod page;
mod service;
mod template;
mod wait;

pub use custom::{CustomElement, CustomElementRegistry};
pub use service::{render, CompositionService};
pub use template::Template;
pub use wait::WaitSet;
