use super::source::TextSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// Reads day exports from files under a local directory.
///
/// Identifiers ending in `.gz` are gunzipped after reading. Invalid UTF-8 is
/// replaced rather than rejected.
pub struct DirTextSource {
    root: PathBuf,
}

impl DirTextSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TextSource for DirTextSource {
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        let path = self.root.join(identifier);
        debug!(path = %path.display(), "Reading source file");

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let bytes = if identifier.ends_with(".gz") {
            let mut decoded = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut decoded)
                .with_context(|| format!("failed to decompress {}", path.display()))?;
            decoded
        } else {
            bytes
        };

        // stray bytes only spoil their own row
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
