use super::client::HttpClient;
use super::source::TextSource;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Fetches day exports as `<base_url>/<identifier>` through an [`HttpClient`].
pub struct HttpTextSource<C> {
    client: C,
    base_url: Url,
}

impl<C: HttpClient> HttpTextSource<C> {
    pub fn new(client: C, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("{base_url} cannot be used as a base URL"));
        }
        Ok(Self { client, base_url })
    }
}

/// Appends `identifier` as a single percent-encoded path segment, so file
/// names with spaces (`september 8.csv`) resolve correctly.
pub fn source_url(base_url: &Url, identifier: &str) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{base_url} cannot be used as a base URL"))?
        .pop_if_empty()
        .push(identifier);
    Ok(url)
}

#[async_trait]
impl<C: HttpClient> TextSource for HttpTextSource<C> {
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        let url = source_url(&self.base_url, identifier)?;
        debug!(url = %url, "Fetching source over HTTP");

        let req = reqwest::Request::new(reqwest::Method::GET, url);
        let resp = self.client.execute(req).await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}
