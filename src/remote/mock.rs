use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Map;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::payload::{ClassificationResult, DatasetRecord, PredictRequest, UploadRequest};
use super::traits::GestureService;

#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    reply: std::result::Result<T, String>,
}

struct MockState {
    uploads: Vec<UploadRequest>,
    predictions: Vec<PredictRequest>,
    upload_script: VecDeque<Scripted<()>>,
    predict_script: VecDeque<Scripted<ClassificationResult>>,
    default_prediction: ClassificationResult,
    records: Vec<DatasetRecord>,
    online: bool,
}

/// In-memory classifier for tests and offline demos.
///
/// Requests are recorded when they arrive. Replies are taken from a script
/// in call order, each after its own delay; once the script runs out uploads
/// succeed immediately and predictions return the default result. Every
/// upload shows up in the dataset listing, failed ones included.
#[derive(Clone)]
pub struct MockGestureService {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockGestureService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGestureService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                uploads: Vec::new(),
                predictions: Vec::new(),
                upload_script: VecDeque::new(),
                predict_script: VecDeque::new(),
                default_prediction: ClassificationResult::new("unknown", 0.0),
                records: Vec::new(),
                online: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_upload_reply(self, delay: Duration, reply: std::result::Result<(), String>) -> Self {
        self.lock().upload_script.push_back(Scripted { delay, reply });
        self
    }

    pub fn with_prediction(self, delay: Duration, result: ClassificationResult) -> Self {
        self.lock().predict_script.push_back(Scripted {
            delay,
            reply: Ok(result),
        });
        self
    }

    pub fn with_prediction_failure(self, delay: Duration, message: impl Into<String>) -> Self {
        self.lock().predict_script.push_back(Scripted {
            delay,
            reply: Err(message.into()),
        });
        self
    }

    pub fn with_default_prediction(self, result: ClassificationResult) -> Self {
        self.lock().default_prediction = result;
        self
    }

    pub fn with_records(self, records: Vec<DatasetRecord>) -> Self {
        self.lock().records = records;
        self
    }

    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.lock().uploads.clone()
    }

    pub fn predictions(&self) -> Vec<PredictRequest> {
        self.lock().predictions.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.lock().uploads.len()
    }

    pub fn predict_count(&self) -> usize {
        self.lock().predictions.len()
    }
}

#[async_trait]
impl GestureService for MockGestureService {
    async fn upload(&self, request: UploadRequest) -> Result<()> {
        let step = {
            let mut state = self.lock();
            state.uploads.push(request);
            state.upload_script.pop_front()
        };

        match step {
            Some(Scripted { delay, reply }) => {
                tokio::time::sleep(delay).await;
                reply.map_err(|e| anyhow!(e))
            }
            None => Ok(()),
        }
    }

    async fn predict(&self, request: PredictRequest) -> Result<ClassificationResult> {
        let (step, fallback) = {
            let mut state = self.lock();
            state.predictions.push(request);
            (state.predict_script.pop_front(), state.default_prediction.clone())
        };

        match step {
            Some(Scripted { delay, reply }) => {
                tokio::time::sleep(delay).await;
                reply.map_err(|e| anyhow!(e))
            }
            None => Ok(fallback),
        }
    }

    async fn dataset(&self) -> Result<Vec<DatasetRecord>> {
        let state = self.lock();
        if !state.online {
            return Err(anyhow!("mock backend offline"));
        }
        let mut records = state.records.clone();
        records.extend(state.uploads.iter().map(|upload| DatasetRecord {
            label: upload.label.clone(),
            extra: Map::new(),
        }));
        Ok(records)
    }

    async fn health(&self) -> Result<()> {
        if self.lock().online {
            Ok(())
        } else {
            Err(anyhow!("mock backend offline"))
        }
    }
}
