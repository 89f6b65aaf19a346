pub mod predictor;
pub mod recorder;
pub mod runtime;
pub mod state;
pub mod throttle;

pub use predictor::Predictor;
pub use recorder::Recorder;
pub use runtime::{ActiveView, CaptureRuntime, RuntimeStatus};
pub use state::{CaptureState, PredictState};
pub use throttle::{DispatchTicket, InferenceThrottle, Throttled};
