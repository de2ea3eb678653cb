//! Progress reporting hook for long-running operations.
//!
//! The library never draws to the terminal itself; the CLI plugs in a
//! progress bar implementation.

/// Receives progress updates from a long-running operation.
pub trait Progress {
    /// Begin a unit of work of `len` steps (0 when the length is unknown).
    fn start(&self, len: u64, message: &str);
    /// Advance by `delta` steps.
    fn advance(&self, delta: u64);
    /// Finish the unit of work.
    fn finish(&self);
}

/// A [`Progress`] that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _len: u64, _message: &str) {}
    fn advance(&self, _delta: u64) {}
    fn finish(&self) {}
}
