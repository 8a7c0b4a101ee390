//! Keeps the terminal transcript in step with the conversation
//!
//! Each refresh prints the messages appended since the previous one. A new
//! user turn supersedes any running reveal, and only the newest assistant
//! reply is typed out.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use tracing::debug;

use crate::chat::{Conversation, Message, Role};
use crate::reveal::{RevealScheduler, RevealTiming};
use crate::ui::output::OutputHandler;
use crate::view::{ConversationView, RevealMode};

/// How a refresh ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Index of the message that was typed out
    pub animated: Option<usize>,
    /// The reveal was cut short by the skip signal
    pub skipped: bool,
}

pub struct Transcript<W: Write = io::Stdout> {
    view: ConversationView,
    scheduler: RevealScheduler,
    output: OutputHandler<W>,
    animate: bool,
}

impl Transcript<io::Stdout> {
    pub fn stdout(timing: RevealTiming, animate: bool) -> Self {
        Self::new(OutputHandler::stdout(), timing, animate)
    }
}

impl<W: Write> Transcript<W> {
    pub fn new(output: OutputHandler<W>, timing: RevealTiming, animate: bool) -> Self {
        Self {
            view: ConversationView::new(),
            scheduler: RevealScheduler::new(timing),
            output,
            animate,
        }
    }

    pub fn output(&mut self) -> &mut OutputHandler<W> {
        &mut self.output
    }

    pub fn scheduler(&self) -> &RevealScheduler {
        &self.scheduler
    }

    pub fn into_output(self) -> OutputHandler<W> {
        self.output
    }

    /// Forget everything shown so far and stop any reveal
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.view = ConversationView::new();
    }

    /// Print whatever was appended to `conversation` since the last call.
    ///
    /// `skip` completing while a reply is typing cancels the reveal and the
    /// rest of the text is printed at once.
    pub async fn refresh<S>(
        &mut self,
        conversation: &Conversation,
        skip: S,
    ) -> io::Result<RefreshOutcome>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(skip);
        let mut outcome = RefreshOutcome::default();

        let update = self.view.sync(conversation);
        if update.entered_history {
            debug!("Switching to history layout");
        }

        for entry in update.new_entries {
            let Some(message) = conversation.get(entry.index) else {
                continue;
            };

            match (entry.role, entry.reveal) {
                (Role::User, _) => {
                    self.scheduler.cancel();
                    self.output.print_user(message)?;
                }
                (Role::Assistant, RevealMode::Full) => self.output.print_assistant(message)?,
                (Role::Assistant, RevealMode::Animate) => {
                    outcome.animated = Some(entry.index);
                    outcome.skipped = self.reveal(entry.index, message, skip.as_mut()).await?;
                }
            }
        }

        if let Some(index) = update.scroll_to {
            debug!(index, "Newest message in view");
        }
        Ok(outcome)
    }

    async fn reveal<S>(
        &mut self,
        index: usize,
        message: &Message,
        mut skip: Pin<&mut S>,
    ) -> io::Result<bool>
    where
        S: Future<Output = ()>,
    {
        let mut frames = self.scheduler.play(index, message.content(), self.animate);
        self.output.begin_reveal()?;

        let mut skipped = false;
        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(frame) => self.output.paint_frame(&frame)?,
                    None => break,
                },
                _ = &mut skip => {
                    debug!(index, "Reveal skipped");
                    self.scheduler.cancel();
                    skipped = true;
                    break;
                }
            }
        }

        self.output.end_reveal(message)?;
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::output::CARET;
    use std::future::{pending, ready};

    fn transcript() -> Transcript<Vec<u8>> {
        Transcript::new(OutputHandler::new(Vec::new()), RevealTiming::default(), true)
    }

    /// Output with styling, caret and cursor moves removed
    fn rendered(transcript: Transcript<Vec<u8>>) -> String {
        let raw = String::from_utf8(transcript.into_output().into_inner()).unwrap();
        console::strip_ansi_codes(&raw).replace(CARET, "")
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_newest_reply_is_typed_out() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Banana peel?"));
        conversation.append(Message::assistant("Compost it."));
        conversation.append(Message::user("Glass jar?"));
        conversation.append(Message::assistant("Rinse, then recycle."));

        let mut transcript = transcript();
        let outcome = transcript.refresh(&conversation, pending()).await.unwrap();

        assert_eq!(outcome.animated, Some(3));
        assert!(!outcome.skipped);

        let text = rendered(transcript);
        assert_eq!(text.matches("Compost it.").count(), 1);
        assert_eq!(text.matches("Rinse, then recycle.").count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_prints_only_new_messages() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Banana peel?"));

        let mut transcript = transcript();
        let outcome = transcript.refresh(&conversation, pending()).await.unwrap();
        assert_eq!(outcome.animated, None);

        conversation.append(Message::assistant("Compost it."));
        let outcome = transcript.refresh(&conversation, pending()).await.unwrap();
        assert_eq!(outcome.animated, Some(1));

        let outcome = transcript.refresh(&conversation, pending()).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::default());

        let text = rendered(transcript);
        assert_eq!(text.matches("Banana peel?").count(), 1);
        assert_eq!(text.matches("Compost it").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_prints_full_reply() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Tips?"));
        conversation.append(
            Message::assistant("Carry a reusable bottle everywhere.").with_category("habits"),
        );

        let mut transcript = transcript();
        let outcome = transcript.refresh(&conversation, ready(())).await.unwrap();

        assert_eq!(outcome.animated, Some(1));
        assert!(outcome.skipped);
        assert_eq!(transcript.scheduler().active_index(), None);

        let text = rendered(transcript);
        assert_eq!(text.matches("Carry a reusable bottle everywhere.").count(), 1);
        assert!(text.contains("habits"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_turn_cancels_running_reveal() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Tips?"));

        let mut transcript = transcript();
        transcript.refresh(&conversation, pending()).await.unwrap();

        let _frames = transcript.scheduler.play(7, "A long reply still typing", true);
        assert_eq!(transcript.scheduler().active_index(), Some(7));

        conversation.append(Message::user("Another question"));
        transcript.refresh(&conversation, pending()).await.unwrap();

        assert_eq!(transcript.scheduler().active_index(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_shows_history_again() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("Tips?"));

        let mut transcript = transcript();
        transcript.refresh(&conversation, pending()).await.unwrap();
        transcript.reset();
        transcript.refresh(&conversation, pending()).await.unwrap();

        assert_eq!(rendered(transcript).matches("Tips?").count(), 2);
    }
}
