use anyhow::Result;
use async_trait::async_trait;

/// Fetches the raw text of a day export by its identifier.
///
/// Implementations must report a missing source or a non-success response as
/// an error, never as empty text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, identifier: &str) -> Result<String>;
}

#[async_trait]
impl<T: TextSource + ?Sized> TextSource for Box<T> {
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        (**self).fetch_text(identifier).await
    }
}
