//! Refreshable metadata registry shared by the host server

use crate::{register, FrontEndMetadata};
use pokeshop_events::{AppEvent, EventEmitter, EventSender, MetadataEvent};
use pokeshop_net::NetClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

/// Live registry over a fixed set of metadata origins
///
/// Every registration replaces the whole snapshot, so a render that took a
/// snapshot keeps one consistent mapping while a refresh runs.
pub struct MetadataResolver {
    client: NetClient,
    urls: Vec<String>,
    current: RwLock<Arc<FrontEndMetadata>>,
    loaded: watch::Sender<bool>,
    tx: EventSender,
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("urls", &self.urls)
            .field("loaded", &*self.loaded.borrow())
            .finish_non_exhaustive()
    }
}

impl MetadataResolver {
    /// Create an empty resolver without loading anything
    #[must_use]
    pub fn new(client: NetClient, urls: Vec<String>, tx: EventSender) -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            client,
            urls,
            current: RwLock::new(Arc::new(FrontEndMetadata::default())),
            loaded,
            tx,
        }
    }

    /// Create a resolver and start the first registration in the background
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn of(client: NetClient, urls: Vec<String>, tx: EventSender) -> Arc<Self> {
        let resolver = Arc::new(Self::new(client, urls, tx));
        let first = Arc::clone(&resolver);
        tokio::spawn(async move {
            first.refresh().await;
        });
        resolver
    }

    /// Wait until the first registration has settled
    ///
    /// Never fails: unreachable sources simply contribute no events.
    pub async fn wait(&self) {
        let mut loaded = self.loaded.subscribe();
        // Sender lives in self, so the channel cannot close while we wait
        let _ = loaded.wait_for(|done| *done).await;
    }

    /// Current mapping
    pub async fn snapshot(&self) -> Arc<FrontEndMetadata> {
        Arc::clone(&*self.current.read().await)
    }

    pub async fn service_file_for_event(&self, event_name: &str) -> Option<String> {
        self.snapshot()
            .await
            .service_file_for_event(event_name)
            .map(ToString::to_string)
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Register every source again and swap in the new mapping
    pub async fn refresh(&self) -> Arc<FrontEndMetadata> {
        let metadata = Arc::new(register(&self.client, &self.urls, &self.tx).await);

        *self.current.write().await = Arc::clone(&metadata);

        if *self.loaded.borrow() {
            self.tx.emit(AppEvent::Metadata(MetadataEvent::Refreshed {
                events: metadata.len(),
            }));
        }
        self.loaded.send_replace(true);

        metadata
    }

    /// Refresh on a fixed interval until the returned task is aborted
    #[must_use]
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let resolver = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                resolver.refresh().await;
            }
        })
    }
}
