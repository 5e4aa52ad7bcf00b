#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for pokeshop
//!
//! This crate handles all outbound HTTP: fragment fetches carrying
//! per-fragment headers and metadata document loads, over a pooled
//! client with retry logic.

mod client;

pub use client::{NetClient, NetConfig};

use pokeshop_errors::{Error, NetworkError};
use pokeshop_events::{EventEmitter, EventSender};

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error status,
/// or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str, tx: &EventSender) -> Result<String, Error> {
    tx.emit_debug(format!("Fetching text from {url}"));

    let response = client.get(url).await?;

    if !response.status().is_success() {
        return Err(NetworkError::HttpError {
            status: response.status().as_u16(),
            message: response.status().to_string(),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| NetworkError::RequestFailed(e.to_string()).into())
}
