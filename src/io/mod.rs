// Purpose - audio device access and the shared audio clock

pub mod clock;
pub mod output;

pub use clock::AudioClock;
pub use output::{AudioOutput, CpalOutput, OfflineDriver, OfflineOutput};
