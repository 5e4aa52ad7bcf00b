//! Embedded `<script>` form of the event map
//!
//! The host page carries the merged mapping so the browser can rebuild the
//! same registry without fetching the metadata sources again.

use crate::FrontEndMetadata;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use pokeshop_errors::{Error, MetadataError};
use pokeshop_types::METADATA_SCRIPT_ID;
use std::collections::BTreeMap;

impl FrontEndMetadata {
    /// JSON text of the event map
    #[must_use]
    pub fn to_json(&self) -> String {
        let map = self
            .event_map()
            .iter()
            .map(|(event, file)| (event.clone(), serde_json::Value::String(file.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map).to_string()
    }

    /// Script node holding the event map
    ///
    /// `</` is written as `<\/` so a service file URL can never close the
    /// script element early; JSON reads both forms the same.
    #[must_use]
    pub fn to_script(&self) -> String {
        format!(
            r#"<script type="application/json" id="{METADATA_SCRIPT_ID}">{}</script>"#,
            self.to_json().replace("</", "<\\/")
        )
    }

    /// Rebuild the mapping from the JSON text of an embedded script
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidEmbeddedScript` if the text is not a
    /// JSON object of strings.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let event_map: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| MetadataError::InvalidEmbeddedScript {
                message: e.to_string(),
            })?;
        Ok(Self::new(event_map))
    }

    /// Rebuild the mapping from a document containing the embedded script
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::MissingEmbeddedScript` if the document has no
    /// metadata script, or `MetadataError::InvalidEmbeddedScript` if its
    /// content cannot be read back.
    pub fn from_document(html: &str) -> Result<Self, Error> {
        let selector = format!("script#{METADATA_SCRIPT_ID}");
        let mut found = false;
        let mut json = String::new();

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(selector, |_el| {
                        found = true;
                        Ok(())
                    }),
                    text!(selector, |chunk| {
                        json.push_str(chunk.as_str());
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|e| MetadataError::InvalidEmbeddedScript {
            message: e.to_string(),
        })?;

        if !found {
            return Err(MetadataError::MissingEmbeddedScript.into());
        }
        Self::from_json(&json)
    }
}
