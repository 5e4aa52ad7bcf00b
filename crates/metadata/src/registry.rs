//! Event map built from metadata documents

use pokeshop_errors::{Error, MetadataError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of a metadata document's `eventsProvider` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsProvider {
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub service_file: Option<String>,
}

impl EventsProvider {
    #[must_use]
    pub fn new<I, S>(events: I, service_file: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: Some(events.into_iter().map(Into::into).collect()),
            service_file: Some(service_file.into()),
        }
    }
}

/// Body of `GET {origin}/metadata`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub events_provider: Vec<EventsProvider>,
}

impl MetadataDocument {
    /// Parse a metadata document served by `url`
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidDocument` if the body is not JSON or
    /// has no `eventsProvider` array.
    pub fn parse(url: &str, body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| {
            MetadataError::InvalidDocument {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Immutable event-name to service-file mapping
///
/// Merging is last-writer-wins: a later provider for the same event
/// replaces the earlier service file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontEndMetadata {
    event_map: BTreeMap<String, String>,
}

impl FrontEndMetadata {
    #[must_use]
    pub fn new(event_map: BTreeMap<String, String>) -> Self {
        Self { event_map }
    }

    /// Build a mapping from documents processed in the given order
    #[must_use]
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a MetadataDocument>) -> Self {
        let mut metadata = Self::default();
        for document in documents {
            metadata.merge_document(document);
        }
        metadata
    }

    /// Merge every complete provider entry of `document`
    ///
    /// Entries missing `events` or `serviceFile` contribute nothing.
    pub fn merge_document(&mut self, document: &MetadataDocument) {
        for provider in &document.events_provider {
            let (Some(events), Some(service_file)) = (&provider.events, &provider.service_file)
            else {
                continue;
            };
            for event in events {
                self.event_map.insert(event.clone(), service_file.clone());
            }
        }
    }

    /// Service file that handles `event_name`, if any provider declared it
    #[must_use]
    pub fn service_file_for_event(&self, event_name: &str) -> Option<&str> {
        self.event_map.get(event_name).map(String::as_str)
    }

    #[must_use]
    pub fn event_map(&self) -> &BTreeMap<String, String> {
        &self.event_map
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.event_map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_map.is_empty()
    }
}

/// Metadata endpoint of a micro-frontend origin
#[must_use]
pub fn metadata_url(origin: &str) -> String {
    if origin.ends_with('/') {
        format!("{origin}metadata")
    } else {
        format!("{origin}/metadata")
    }
}
