#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Front-end metadata registry for pokeshop
//!
//! Every micro-frontend origin serves `GET /metadata` describing which
//! script handles which page event. This crate fetches those documents,
//! merges them into one event map, and moves that map in and out of the
//! embedded script of a composed page.

mod embed;
mod registry;
mod resolver;

pub use registry::{metadata_url, EventsProvider, FrontEndMetadata, MetadataDocument};
pub use resolver::MetadataResolver;

use futures::future::join_all;
use pokeshop_errors::{Error, MetadataError};
use pokeshop_events::{AppEvent, EventEmitter, EventSender, FailureContext, MetadataEvent};
use pokeshop_net::{fetch_text, NetClient};

/// Fetch the metadata document of one origin
///
/// # Errors
///
/// Returns `MetadataError::SourceUnreachable` if the endpoint cannot be
/// fetched, or `MetadataError::InvalidDocument` if the body has no
/// `eventsProvider` array.
pub async fn load_source(
    client: &NetClient,
    origin: &str,
    tx: &EventSender,
) -> Result<MetadataDocument, Error> {
    let url = metadata_url(origin);
    let body = fetch_text(client, &url, tx)
        .await
        .map_err(|e| MetadataError::SourceUnreachable {
            url: url.clone(),
            message: e.to_string(),
        })?;
    MetadataDocument::parse(&url, &body)
}

/// Register every origin and return the merged mapping
///
/// All sources are fetched concurrently and merged in input order, so for
/// a shared event the last listed origin wins. A failing source is
/// reported as an event and skipped; registration itself never fails.
pub async fn register(
    client: &NetClient,
    origins: &[String],
    tx: &EventSender,
) -> FrontEndMetadata {
    let results = join_all(origins.iter().map(|origin| load_source(client, origin, tx))).await;

    let mut metadata = FrontEndMetadata::default();
    let mut failed_sources = 0;

    for (origin, result) in origins.iter().zip(results) {
        match result {
            Ok(document) => {
                tx.emit(AppEvent::Metadata(MetadataEvent::SourceLoaded {
                    url: metadata_url(origin),
                    providers: document.events_provider.len(),
                }));
                metadata.merge_document(&document);
            }
            Err(e) => {
                failed_sources += 1;
                tx.emit(AppEvent::Metadata(MetadataEvent::SourceFailed {
                    url: metadata_url(origin),
                    failure: FailureContext::from_error(&e),
                }));
            }
        }
    }

    tx.emit(AppEvent::Metadata(MetadataEvent::Registered {
        sources: origins.len(),
        failed_sources,
        events: metadata.len(),
    }));

    metadata
}
