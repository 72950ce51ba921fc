//! Typewriter reveal: a timer task that uncovers a rendered reply in steps.
//!
//! The schedule is pure ([`RevealSchedule`]); [`spawn_reveal`] drives it on a
//! `tokio` interval and reports progress over a channel. Every reveal owns a
//! [`CancellationToken`], and dropping its [`RevealHandle`] stops it.

use crate::config::RevealConfig;
use crate::conversation::MessageId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Visible lengths for a reveal of `total` characters in steps of `step`.
///
/// Yields `step, 2*step, ...`, clamped so the last value is exactly `total`.
/// There are `ceil(total / step)` values, and only the last equals `total`.
#[derive(Debug, Clone)]
pub struct RevealSchedule {
    total: usize,
    step: usize,
    shown: usize,
}

impl RevealSchedule {
    pub fn new(total: usize, step: usize) -> Self {
        Self {
            total,
            step: step.max(1),
            shown: 0,
        }
    }

    /// Number of frames this schedule produces.
    pub fn frame_count(&self) -> usize {
        self.total.div_ceil(self.step)
    }
}

impl Iterator for RevealSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.shown >= self.total {
            return None;
        }
        self.shown = (self.shown + self.step).min(self.total);
        Some(self.shown)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.shown).div_ceil(self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RevealSchedule {}

/// Progress reported by a running reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// Show the first `visible` rendered characters of `message`.
    Frame { message: MessageId, visible: usize },
    /// The last frame has been sent. Sent once, and never after cancellation.
    Finished { message: MessageId },
}

impl RevealEvent {
    /// The message this event is for.
    pub fn message(&self) -> MessageId {
        match self {
            RevealEvent::Frame { message, .. } | RevealEvent::Finished { message } => *message,
        }
    }
}

/// Owner of a running reveal task.
#[derive(Debug)]
pub struct RevealHandle {
    message: MessageId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RevealHandle {
    /// Message being revealed.
    pub fn message(&self) -> MessageId {
        self.message
    }

    /// Stop the reveal. No further events are sent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start revealing `total` rendered characters of `message`.
///
/// The first frame is sent immediately and then one every `config.delay()`.
/// `RevealEvent::Finished` follows the last frame. Must be called inside a
/// `tokio` runtime.
pub fn spawn_reveal(
    message: MessageId,
    total: usize,
    config: &RevealConfig,
    tx: mpsc::UnboundedSender<RevealEvent>,
) -> RevealHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let schedule = RevealSchedule::new(total, config.step_chars);
    let delay = config.delay();

    tracing::debug!(?message, total, frames = schedule.frame_count(), "starting reveal");

    let task = tokio::spawn(async move {
        let mut ticker = interval(delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for visible in schedule {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!(?message, visible, "reveal cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }
            if tx.send(RevealEvent::Frame { message, visible }).is_err() {
                return;
            }
        }

        if !token.is_cancelled() {
            let _ = tx.send(RevealEvent::Finished { message });
        }
    });

    RevealHandle {
        message,
        cancel,
        task,
    }
}
