pub mod mock;
pub mod traits;

pub use traits::{DetectionSource, SourceState, Tick};
