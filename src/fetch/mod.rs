//! Loading raw day exports by identifier, over HTTP or from a local directory.

mod basic;
mod client;
mod dir;
mod http;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use dir::DirTextSource;
pub use http::{HttpTextSource, source_url};
pub use source::TextSource;

use anyhow::Result;

/// Builds the text source for a location: `http(s)://` base URLs are fetched
/// over HTTP, anything else is read as a local directory.
pub fn source_for(location: &str) -> Result<Box<dyn TextSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpTextSource::new(BasicClient::new(), location)?))
    } else {
        Ok(Box::new(DirTextSource::new(location)))
    }
}
