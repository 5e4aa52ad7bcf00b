#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Micro-frontend fragments for pokeshop
//!
//! A page names its fragments with `front-end-fragment` elements. This
//! crate fetches their HTML (`resolver`), runs each element through its
//! lifecycle for the current render environment (`element`, `host`), and
//! collects the service scripts their event dependencies require
//! (`inject`).

mod element;
mod host;
pub mod html;
mod inject;
mod resolver;

pub use element::{AttachContext, Completion, FragmentElement, FragmentState};
pub use host::{
    host_for, recreate_scripts, script_sources, BrowserHost, FragmentHost, ServerHost,
};
pub use inject::{DependencyInjector, FRAGMENT_FINISHED_EVENT};
pub use resolver::{FailureHook, FragmentResolver, HttpFragmentResolver, ResolverHooks};
