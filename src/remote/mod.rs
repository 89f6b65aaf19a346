pub mod dataset;
pub mod http;
pub mod mock;
pub mod payload;
pub mod traits;

pub use dataset::{check_backend, BackendStatus, DatasetSummary};
pub use http::HttpGestureService;
pub use mock::MockGestureService;
pub use payload::{
    ClassificationResult, DatasetRecord, PredictRequest, SequenceField, UploadRequest,
};
pub use traits::GestureService;
