use thiserror::Error;

/// A day export could not be fetched; the whole aggregation is abandoned.
#[derive(Error, Debug)]
#[error("failed to load source {identifier}: {source}")]
pub struct SourceLoadError {
    pub identifier: String,
    #[source]
    pub source: anyhow::Error,
}
