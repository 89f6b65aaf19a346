use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::core::CaptureError;
use crate::observability::PipelineMetrics;
use crate::remote::{ClassificationResult, GestureService, PredictRequest, UploadRequest};
use super::ErrorPolicy;

/// Dispatch boundary around a [`GestureService`].
///
/// Applies the request timeout, records latency and errors, and turns every
/// collaborator failure into a [`CaptureError`] according to the policy.
/// `Ok(None)` means the failure was dropped.
#[derive(Clone)]
pub struct ResilientService {
    inner: Arc<dyn GestureService>,
    metrics: Arc<PipelineMetrics>,
    error_policy: ErrorPolicy,
    timeout: Duration,
}

impl ResilientService {
    pub fn new(
        inner: Arc<dyn GestureService>,
        metrics: Arc<PipelineMetrics>,
        error_policy: ErrorPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inner,
            metrics,
            error_policy,
            timeout,
        }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<Option<()>, CaptureError> {
        self.guarded("upload", self.inner.upload(request)).await
    }

    pub async fn predict(
        &self,
        request: PredictRequest,
    ) -> Result<Option<ClassificationResult>, CaptureError> {
        self.guarded("predict", self.inner.predict(request)).await
    }

    async fn guarded<T, F>(&self, what: &str, call: F) -> Result<Option<T>, CaptureError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        self.metrics.record_dispatch();
        let start = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CaptureError::Transient(format!("{:#}", e))),
            Err(_) => Err(CaptureError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => {
                self.metrics.record_latency(start.elapsed());
                Ok(Some(value))
            }
            Err(e) => {
                self.metrics.record_error();
                match self.error_policy {
                    ErrorPolicy::Propagate => {
                        log::warn!("{} failed: {}", what, e);
                        Err(e)
                    }
                    ErrorPolicy::Drop => {
                        log::debug!("{} failed, dropping: {}", what, e);
                        Ok(None)
                    }
                }
            }
        }
    }
}
