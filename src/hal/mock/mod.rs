pub mod hand;
pub mod scripted;

pub use hand::{open_hand, wave_script};
pub use scripted::{ManualTrigger, ScriptedSource, MANUAL_QUEUE_DEPTH};
