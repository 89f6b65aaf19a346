use anyhow::Result;
use async_trait::async_trait;
use super::payload::{ClassificationResult, DatasetRecord, PredictRequest, UploadRequest};

/// Remote classifier and dataset store.
///
/// Implementations own transport details (URLs, field naming, timeouts at
/// the socket level). Callers treat every error as transient.
#[async_trait]
pub trait GestureService: Send + Sync {
    /// Store one labelled sequence
    async fn upload(&self, request: UploadRequest) -> Result<()>;

    /// Classify a window or a single frame
    async fn predict(&self, request: PredictRequest) -> Result<ClassificationResult>;

    /// List stored examples
    async fn dataset(&self) -> Result<Vec<DatasetRecord>>;

    /// Liveness probe; `Ok` means the backend answered
    async fn health(&self) -> Result<()>;
}
