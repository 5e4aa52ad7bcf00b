//! Script injection for fragment event dependencies

use crate::html::script_tag;
use pokeshop_events::{
    AppEvent, BusEvent, CompositionEvent, EventBus, EventEmitter, EventSender, Subscription,
};
use pokeshop_metadata::FrontEndMetadata;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Bus event published by a fragment element once it has completed
pub const FRAGMENT_FINISHED_EVENT: &str = "fragment:finished";

/// Collects the service scripts a page needs for the events its
/// fragments depend on
///
/// A script is added at most once per `src`, counting scripts the page
/// already carried.
#[derive(Debug)]
pub struct DependencyInjector {
    metadata: Arc<FrontEndMetadata>,
    present: HashSet<String>,
    injected: Vec<String>,
    tx: Option<EventSender>,
}

impl DependencyInjector {
    #[must_use]
    pub fn new(metadata: Arc<FrontEndMetadata>) -> Self {
        Self {
            metadata,
            present: HashSet::new(),
            injected: Vec::new(),
            tx: None,
        }
    }

    /// Record `src` values of scripts already present in the page
    #[must_use]
    pub fn with_existing_scripts<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.present.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Record scripts that became part of the page after the render began
    pub fn mark_present<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.present.extend(sources.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    pub fn inject_dependencies_of_events<S: AsRef<str>>(&mut self, events: &[S]) {
        for event in events {
            self.inject_dependency_of_event(event.as_ref());
        }
    }

    /// Add the service script of `event`; returns whether a script was added
    pub fn inject_dependency_of_event(&mut self, event: &str) -> bool {
        let Some(service_file) = self.metadata.service_file_for_event(event) else {
            self.tx
                .emit(AppEvent::Composition(CompositionEvent::DependencyMissing {
                    event: event.to_string(),
                }));
            return false;
        };

        if !self.present.insert(service_file.to_string()) {
            return false;
        }

        self.injected.push(service_file.to_string());
        self.tx
            .emit(AppEvent::Composition(CompositionEvent::DependencyInjected {
                event: event.to_string(),
                service_file: service_file.to_string(),
            }));
        true
    }

    /// Scripts added so far, in injection order
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        &self.injected
    }

    /// Markup of the added scripts
    #[must_use]
    pub fn render_scripts(&self) -> String {
        self.injected.iter().map(|src| script_tag(src)).collect()
    }

    /// Inject the dependencies announced by every `fragment:finished` event
    /// published on `bus`
    pub fn listen(injector: &Arc<Mutex<Self>>, bus: &EventBus) -> Subscription {
        let injector = Arc::clone(injector);
        bus.subscribe(FRAGMENT_FINISHED_EVENT, move |event: &BusEvent| {
            let strings = |key: &str| -> Vec<String> {
                event.detail[key]
                    .as_array()
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(|v| v.as_str().map(ToString::to_string))
                            .collect()
                    })
                    .unwrap_or_default()
            };
            let sources = strings("scriptSources");
            let events = strings("eventDependencies");
            if sources.is_empty() && events.is_empty() {
                return;
            }
            let mut injector = injector.lock().unwrap_or_else(PoisonError::into_inner);
            // Scripts the fragment brought along count as present
            injector.mark_present(sources);
            injector.inject_dependencies_of_events(&events);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokeshop_events::channel;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn metadata() -> Arc<FrontEndMetadata> {
        let mut map = BTreeMap::new();
        map.insert("cart:add".to_string(), "http://localhost:3001/cart.js".to_string());
        map.insert("cart:items".to_string(), "http://localhost:3001/cart.js".to_string());
        map.insert("checkout".to_string(), "http://localhost:3002/checkout.js".to_string());
        Arc::new(FrontEndMetadata::new(map))
    }

    #[test]
    fn test_same_event_injected_once() {
        let mut injector = DependencyInjector::new(metadata());
        assert!(injector.inject_dependency_of_event("cart:add"));
        assert!(!injector.inject_dependency_of_event("cart:add"));
        // Different event, same service file
        assert!(!injector.inject_dependency_of_event("cart:items"));

        assert_eq!(injector.scripts(), ["http://localhost:3001/cart.js"]);
        assert_eq!(injector.render_scripts().matches("<script").count(), 1);
    }

    #[test]
    fn test_existing_script_is_not_duplicated() {
        let mut injector = DependencyInjector::new(metadata())
            .with_existing_scripts(["http://localhost:3002/checkout.js"]);

        assert!(!injector.inject_dependency_of_event("checkout"));
        assert!(injector.scripts().is_empty());
    }

    #[test]
    fn test_missing_dependency_is_reported() {
        let (tx, mut rx) = channel();
        let mut injector = DependencyInjector::new(metadata()).with_event_sender(Some(tx));

        assert!(!injector.inject_dependency_of_event("pokedex:open"));
        assert!(injector.scripts().is_empty());

        let message = rx.try_recv().unwrap();
        assert!(matches!(
            message.event,
            AppEvent::Composition(CompositionEvent::DependencyMissing { ref event }) if event == "pokedex:open"
        ));
    }

    #[test]
    fn test_listens_on_bus() {
        let bus = EventBus::new();
        let injector = Arc::new(Mutex::new(DependencyInjector::new(metadata())));
        let subscription = DependencyInjector::listen(&injector, &bus);

        bus.publish(
            FRAGMENT_FINISHED_EVENT,
            Some(json!({"id": "cart", "eventDependencies": ["cart:add", "checkout"]})),
        );
        bus.publish(FRAGMENT_FINISHED_EVENT, Some(json!({"id": "empty", "eventDependencies": []})));

        subscription.unsubscribe();
        bus.publish(
            FRAGMENT_FINISHED_EVENT,
            Some(json!({"id": "late", "eventDependencies": ["cart:items"]})),
        );

        let injector = injector.lock().unwrap();
        assert_eq!(
            injector.scripts(),
            ["http://localhost:3001/cart.js", "http://localhost:3002/checkout.js"]
        );
    }

    #[test]
    fn test_script_shipped_by_fragment_is_not_duplicated() {
        let bus = EventBus::new();
        let injector = Arc::new(Mutex::new(DependencyInjector::new(metadata())));
        let _subscription = DependencyInjector::listen(&injector, &bus);

        bus.publish(
            FRAGMENT_FINISHED_EVENT,
            Some(json!({
                "id": "cart",
                "eventDependencies": ["cart:add", "checkout"],
                "scriptSources": ["http://localhost:3001/cart.js"],
            })),
        );

        let injector = injector.lock().unwrap();
        assert_eq!(injector.scripts(), ["http://localhost:3002/checkout.js"]);
    }

    #[test]
    fn test_empty_dependencies_inject_nothing() {
        let mut injector = DependencyInjector::new(metadata());
        injector.inject_dependencies_of_events::<&str>(&[]);
        assert!(injector.render_scripts().is_empty());
    }
}
