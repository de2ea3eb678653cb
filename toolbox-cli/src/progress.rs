//! indicatif-backed progress display for long-running core loops.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use toolbox_core::progress::Progress;

/// Renders a bar when the length is known and a spinner otherwise.
/// Draws to stderr, or nowhere when disabled (JSON or quiet output).
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new(enabled: bool) -> Self {
        let target = if enabled {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            bar: ProgressBar::with_draw_target(None, target),
        }
    }
}

impl Progress for TerminalProgress {
    fn start(&self, len: u64, message: &str) {
        if len == 0 {
            self.bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg} ({elapsed})")
                    .unwrap(),
            );
            self.bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40}] {pos}/{len}")
                    .unwrap()
                    .progress_chars("=> "),
            );
            self.bar.set_length(len);
        }
        self.bar.set_position(0);
        self.bar.set_message(message.to_string());
    }

    fn advance(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
