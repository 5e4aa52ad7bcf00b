//! Integration tests for the metadata registry

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pokeshop_events::{channel, AppEvent, MetadataEvent};
    use pokeshop_metadata::*;
    use pokeshop_net::{NetClient, NetConfig};
    use std::time::Duration;

    fn client() -> NetClient {
        NetClient::new(NetConfig {
            retry_count: 0,
            ..NetConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_single_source() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let mock = server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"eventsProvider":[{"events":["A","B"],"serviceFile":"s.js"}]}"#);
        });

        let metadata = register(&client(), &[server.url("/")], &tx).await;

        mock.assert();
        assert_eq!(metadata.service_file_for_event("A"), Some("s.js"));
        assert_eq!(metadata.service_file_for_event("Z"), None);
    }

    #[tokio::test]
    async fn test_failing_source_does_not_fail_registration() {
        let good = MockServer::start();
        let (tx, mut rx) = channel();

        good.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .body(r#"{"eventsProvider":[{"events":["cart:add"],"serviceFile":"cart.js"}]}"#);
        });

        let origins = vec!["http://127.0.0.1:9/".to_string(), good.url("/")];
        let metadata = register(&client(), &origins, &tx).await;

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.service_file_for_event("cart:add"), Some("cart.js"));

        let mut failed = 0;
        let mut registered = None;
        while let Ok(message) = rx.try_recv() {
            match message.event {
                AppEvent::Metadata(MetadataEvent::SourceFailed { .. }) => failed += 1,
                AppEvent::Metadata(MetadataEvent::Registered { failed_sources, .. }) => {
                    registered = Some(failed_sources);
                }
                _ => {}
            }
        }
        assert_eq!(failed, 1);
        assert_eq!(registered, Some(1));
    }

    #[tokio::test]
    async fn test_merge_follows_input_order() {
        let first = MockServer::start();
        let second = MockServer::start();
        let (tx, _rx) = channel();

        first.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .body(r#"{"eventsProvider":[{"events":["shared","only-first"],"serviceFile":"first.js"}]}"#);
        });
        // The later origin answers last but also comes last in input order
        second.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .delay(Duration::from_millis(100))
                .body(r#"{"eventsProvider":[{"events":["shared"],"serviceFile":"second.js"}]}"#);
        });

        let forward = register(&client(), &[first.url("/"), second.url("/")], &tx).await;
        assert_eq!(forward.service_file_for_event("shared"), Some("second.js"));
        assert_eq!(forward.service_file_for_event("only-first"), Some("first.js"));

        let backward = register(&client(), &[second.url("/"), first.url("/")], &tx).await;
        assert_eq!(backward.service_file_for_event("shared"), Some("first.js"));
    }

    #[tokio::test]
    async fn test_document_without_providers_is_ignored() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200).body(r#"{"name":"catalog"}"#);
        });

        let metadata = register(&client(), &[server.url("")], &tx).await;
        assert!(metadata.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_wait_and_refresh() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let mut mock = server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .body(r#"{"eventsProvider":[{"events":["A"],"serviceFile":"v1.js"}]}"#);
        });

        let resolver = MetadataResolver::of(client(), vec![server.url("/")], tx);
        resolver.wait().await;
        assert_eq!(
            resolver.service_file_for_event("A").await.as_deref(),
            Some("v1.js")
        );

        let before = resolver.snapshot().await;

        mock.delete();
        server.mock(|when, then| {
            when.method(GET).path("/metadata");
            then.status(200)
                .body(r#"{"eventsProvider":[{"events":["A"],"serviceFile":"v2.js"}]}"#);
        });

        resolver.refresh().await;
        assert_eq!(
            resolver.service_file_for_event("A").await.as_deref(),
            Some("v2.js")
        );
        // Snapshots taken earlier are not affected
        assert_eq!(before.service_file_for_event("A"), Some("v1.js"));
    }

    #[tokio::test]
    async fn test_resolver_wait_with_no_reachable_source() {
        let (tx, _rx) = channel();
        let resolver = MetadataResolver::of(client(), vec!["http://127.0.0.1:9/".to_string()], tx);

        resolver.wait().await;
        assert!(resolver.snapshot().await.is_empty());
    }
}
