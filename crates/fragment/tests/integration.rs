//! Integration tests for the fragment resolver

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pokeshop_errors::{Error, FragmentError};
    use pokeshop_events::{channel, AppEvent, EventBus, FragmentEvent, FragmentStatus};
    use pokeshop_fragment::*;
    use pokeshop_net::{NetClient, NetConfig};
    use pokeshop_types::FragmentOptions;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn client() -> NetClient {
        NetClient::new(NetConfig {
            retry_count: 0,
            ..NetConfig::default()
        })
        .unwrap()
    }

    type Calls = Arc<Mutex<Vec<(String, String)>>>;

    fn recording_hooks() -> (ResolverHooks, Calls, Calls) {
        let fatal: Calls = Arc::default();
        let errors: Calls = Arc::default();
        let hooks = {
            let fatal = Arc::clone(&fatal);
            let errors = Arc::clone(&errors);
            ResolverHooks::new()
                .on_fatal(move |url, e| fatal.lock().unwrap().push((url.to_string(), e.to_string())))
                .on_error(move |url, e| errors.lock().unwrap().push((url.to_string(), e.to_string())))
        };
        (hooks, fatal, errors)
    }

    #[tokio::test]
    async fn test_resolve_reads_body_and_dependency_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/").header("ping", "pong");
            then.status(200)
                .header("X-Event-Dependency", "e1, e2")
                .body("<section>cart</section>");
        });

        let resolver = HttpFragmentResolver::new(client());
        let options = FragmentOptions::new(server.url("/")).with_header("ping", "pong");
        let result = resolver.resolve(&options).await.unwrap();

        mock.assert();
        assert_eq!(result.html, "<section>cart</section>");
        assert_eq!(result.event_dependencies, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_empty_dependency_header_yields_no_events() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("X-Event-Dependency", "").body("<p/>");
        });

        let resolver = HttpFragmentResolver::new(client());
        let result = resolver
            .resolve(&FragmentOptions::new(server.url("/")))
            .await
            .unwrap();
        assert!(result.event_dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(503).body("<p>catalog is resting</p>");
        });

        let (hooks, fatal, errors) = recording_hooks();
        let resolver = HttpFragmentResolver::new(client()).with_hooks(hooks);
        let result = resolver
            .resolve(&FragmentOptions::new(server.url("/")).required(true))
            .await;

        assert_eq!(result.unwrap().html, "<p>catalog is resting</p>");
        assert!(fatal.lock().unwrap().is_empty());
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_required_failure_calls_fatal_hook() {
        let (hooks, fatal, errors) = recording_hooks();
        let resolver = HttpFragmentResolver::new(client()).with_hooks(hooks);

        let result = resolver
            .resolve(&FragmentOptions::new("http://127.0.0.1:9/").required(true))
            .await;

        assert!(result.is_none());
        let fatal = fatal.lock().unwrap();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].0, "http://127.0.0.1:9/");
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optional_failure_calls_error_hook() {
        let (tx, mut rx) = channel();
        let (hooks, fatal, errors) = recording_hooks();
        let resolver = HttpFragmentResolver::new(client())
            .with_hooks(hooks)
            .with_event_sender(tx);

        let result = resolver
            .resolve(&FragmentOptions::new("http://127.0.0.1:9/"))
            .await;

        assert!(result.is_none());
        assert!(fatal.lock().unwrap().is_empty());
        assert_eq!(errors.lock().unwrap().len(), 1);

        let mut saw_failed = false;
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Fragment(FragmentEvent::Failed { required, .. }) = message.event {
                assert!(!required);
                saw_failed = true;
            }
        }
        assert!(saw_failed);
    }

    #[tokio::test]
    async fn test_deadline_is_a_transport_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500)).body("late");
        });

        let seen: Arc<Mutex<Option<Error>>> = Arc::default();
        let hooks = {
            let seen = Arc::clone(&seen);
            ResolverHooks::new().on_error(move |_, e| *seen.lock().unwrap() = Some(e.clone()))
        };
        let resolver = HttpFragmentResolver::new(client())
            .with_timeout(Some(Duration::from_millis(50)))
            .with_hooks(hooks);

        let result = resolver
            .resolve(&FragmentOptions::new(server.url("/slow")))
            .await;

        assert!(result.is_none());
        assert!(matches!(
            seen.lock().unwrap().as_ref(),
            Some(Error::Fragment(FragmentError::Timeout { deadline_ms: 50, .. }))
        ));
    }

    #[tokio::test]
    async fn test_element_over_http_injects_dependencies() {
        use pokeshop_metadata::FrontEndMetadata;
        use std::collections::BTreeMap;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(200)
                .header("X-Event-Dependency", "cart:add")
                .body("<button>add</button>");
        });

        let mut map = BTreeMap::new();
        map.insert("cart:add".to_string(), "http://localhost:3001/cart.js".to_string());
        let injector = Arc::new(Mutex::new(DependencyInjector::new(Arc::new(
            FrontEndMetadata::new(map),
        ))));

        let bus = EventBus::new();
        let _subscription = DependencyInjector::listen(&injector, &bus);
        let ctx = AttachContext {
            host: host_for(pokeshop_types::RenderEnvironment::Server),
            resolver: Arc::new(HttpFragmentResolver::new(client())),
            bus,
            tx: None,
        };

        let mut first = FragmentElement::new("a", FragmentOptions::new(server.url("/cart")));
        let mut second = FragmentElement::new("b", FragmentOptions::new(server.url("/cart")));
        assert_eq!(first.attach(&ctx).await.status, FragmentStatus::Resolved);
        assert_eq!(second.attach(&ctx).await.status, FragmentStatus::Resolved);

        assert_eq!(
            injector.lock().unwrap().scripts(),
            ["http://localhost:3001/cart.js"]
        );
    }
}
