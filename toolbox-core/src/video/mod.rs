//! Video utilities backed by an external ffmpeg.

pub mod merge;

pub use merge::{merge, MergeOptions, MergeReport};
