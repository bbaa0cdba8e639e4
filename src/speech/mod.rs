//! Speech synthesis, caching, and playback

mod cache;
mod playback;
mod synth;

pub use cache::{AudioCache, SpeechService};
pub use playback::{PlaybackHandle, SpeechPlayback};
pub use synth::SpeechSynthesizer;
