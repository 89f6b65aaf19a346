pub mod error;
pub mod frame;
pub mod landmark;
pub mod normalizer;
pub mod sequence;

pub use error::CaptureError;
pub use frame::Frame;
pub use landmark::{DetectionResult, Landmark};
pub use normalizer::LandmarkNormalizer;
pub use sequence::Sequence;
