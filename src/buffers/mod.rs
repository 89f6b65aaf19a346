pub mod recording;
pub mod window;

pub use recording::SequenceBuffer;
pub use window::SequenceWindow;
