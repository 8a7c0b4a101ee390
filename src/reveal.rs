//! Typing reveal for assistant replies
//!
//! [`Reveal`] is the pure per-message state machine
//! (`Idle -> Revealing -> Settling -> Done`). [`RevealScheduler`] drives it
//! on tokio timers and streams [`RevealFrame`]s to the renderer. Only one
//! reveal runs at a time: starting a new one cancels the previous one.
//!
//! A "character" here is a Unicode scalar value, so multi-byte text is never
//! split inside a code point.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_CHAR_INTERVAL: Duration = Duration::from_millis(13);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Revealing,
    Settling,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    text: String,
    total: usize,
    cursor: usize,
    byte_end: usize,
    phase: RevealPhase,
    animate: bool,
}

impl Reveal {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let total = text.chars().count();
        Self {
            text,
            total,
            cursor: 0,
            byte_end: 0,
            phase: RevealPhase::Idle,
            animate: false,
        }
    }

    /// Leave `Idle`. Empty text and non-animated messages go straight to
    /// `Done` with everything visible.
    pub fn start(&mut self, animate: bool) {
        self.animate = animate;
        self.cursor = 0;
        self.byte_end = 0;

        if !animate || self.total == 0 {
            self.skip();
        } else {
            self.phase = RevealPhase::Revealing;
        }
    }

    /// One tick: expose one more character. Returns false outside `Revealing`.
    pub fn advance(&mut self) -> bool {
        if self.phase != RevealPhase::Revealing {
            return false;
        }

        if let Some(ch) = self.text[self.byte_end..].chars().next() {
            self.byte_end += ch.len_utf8();
            self.cursor += 1;
        }

        if self.cursor >= self.total {
            self.phase = RevealPhase::Settling;
        }
        true
    }

    /// Hide the typing caret once the settle delay has elapsed
    pub fn settle(&mut self) -> bool {
        if self.phase != RevealPhase::Settling {
            return false;
        }
        self.phase = RevealPhase::Done;
        true
    }

    /// Jump to `Done` with the whole text visible
    pub fn skip(&mut self) {
        self.cursor = self.total;
        self.byte_end = self.text.len();
        self.phase = RevealPhase::Done;
    }

    /// Restart from `Idle` if the text or the animate flag changed
    pub fn retarget(&mut self, text: &str, animate: bool) {
        if self.text == text && self.animate == animate && self.phase != RevealPhase::Idle {
            return;
        }
        *self = Reveal::new(text);
        self.start(animate);
    }

    pub fn visible(&self) -> &str {
        &self.text[..self.byte_end]
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Caret visible: still revealing or settling
    pub fn is_typing(&self) -> bool {
        matches!(self.phase, RevealPhase::Revealing | RevealPhase::Settling)
    }

    pub fn is_done(&self) -> bool {
        self.phase == RevealPhase::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub char_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            char_interval: DEFAULT_CHAR_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// What the renderer should show for the message at `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub index: usize,
    pub visible: String,
    pub typing: bool,
    pub phase: RevealPhase,
}

impl RevealFrame {
    fn of(index: usize, reveal: &Reveal) -> Self {
        Self {
            index,
            visible: reveal.visible().to_string(),
            typing: reveal.is_typing(),
            phase: reveal.phase(),
        }
    }
}

/// Handle to a running reveal task. Cancels the task when dropped.
#[derive(Debug)]
pub struct RevealHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task to end on its own
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Start a reveal task for `text`. Frames go to `tx`; the task stops on
/// cancellation, when the receiver goes away, or after the `Done` frame.
pub fn spawn_reveal(
    index: usize,
    text: String,
    animate: bool,
    timing: RevealTiming,
    tx: mpsc::UnboundedSender<RevealFrame>,
) -> RevealHandle {
    let token = CancellationToken::new();
    let task_token = token.clone();

    let task = tokio::spawn(async move {
        let token = task_token;
        let mut reveal = Reveal::new(text);
        reveal.start(animate);

        if !emit(&token, &tx, index, &reveal) || reveal.is_done() {
            return;
        }

        let mut ticker = interval_at(Instant::now() + timing.char_interval, timing.char_interval);
        while reveal.phase() == RevealPhase::Revealing {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = ticker.tick() => {
                    reveal.advance();
                    if !emit(&token, &tx, index, &reveal) {
                        return;
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = sleep(timing.settle_delay) => {
                reveal.settle();
                emit(&token, &tx, index, &reveal);
            }
        }
    });

    RevealHandle {
        token,
        task: Some(task),
    }
}

fn emit(
    token: &CancellationToken,
    tx: &mpsc::UnboundedSender<RevealFrame>,
    index: usize,
    reveal: &Reveal,
) -> bool {
    if token.is_cancelled() {
        return false;
    }
    tx.send(RevealFrame::of(index, reveal)).is_ok()
}

/// Owns the single active reveal
#[derive(Debug, Default)]
pub struct RevealScheduler {
    timing: RevealTiming,
    active: Option<(usize, RevealHandle)>,
}

impl RevealScheduler {
    pub fn new(timing: RevealTiming) -> Self {
        Self {
            timing,
            active: None,
        }
    }

    /// Reveal the message at `index`, superseding whatever was running
    pub fn play(
        &mut self,
        index: usize,
        text: &str,
        animate: bool,
    ) -> mpsc::UnboundedReceiver<RevealFrame> {
        self.cancel();

        let (tx, rx) = mpsc::unbounded_channel();
        debug!(index, chars = text.chars().count(), animate, "Starting reveal");
        let handle = spawn_reveal(index, text.to_string(), animate, self.timing, tx);
        self.active = Some((index, handle));
        rx
    }

    /// Cancel the running reveal, if any
    pub fn cancel(&mut self) {
        if let Some((index, handle)) = self.active.take() {
            if !handle.is_finished() {
                debug!(index, "Cancelling reveal");
            }
            handle.cancel();
        }
    }

    /// Index of the message being revealed, while its task is alive
    pub fn active_index(&self) -> Option<usize> {
        self.active
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(index, _)| *index)
    }
}
