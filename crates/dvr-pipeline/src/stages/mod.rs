//! The concrete pipeline stages, one module per step.

pub mod acquire;
pub mod captions;
pub mod cut;
pub mod remux;
pub mod scan;
pub mod subtitles;
pub mod transcode;

pub use acquire::AcquireStage;
pub use captions::CaptionsStage;
pub use cut::CutStage;
pub use remux::RemuxStage;
pub use scan::ScanStage;
pub use subtitles::SubtitlesStage;
pub use transcode::TranscodeStage;
