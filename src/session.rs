//! Conversation session: history, in-flight tracking, and the request
//! dispatcher that turns one user question into one assistant reply.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::{normalize, QuestionRequest, RawResponse, Transport};
use crate::chat::{Conversation, Message};
use crate::utils::error::{ChatError, ChatResult, SessionError};

/// Content of the reply shown whenever the service cannot be reached
pub const FALLBACK_CONTENT: &str = "Esto es una pregunta falsa";
pub const FALLBACK_MODELO: &str = "gpt-4";
pub const FALLBACK_DIFFICULTY: &str = "media";
pub const FALLBACK_CATEGORY: &str = "general";

/// The fixed assistant reply substituted for any failed request
pub fn fallback_message() -> Message {
    Message::assistant(FALLBACK_CONTENT)
        .with_modelo(FALLBACK_MODELO)
        .with_difficulty(FALLBACK_DIFFICULTY)
        .with_category(FALLBACK_CATEGORY)
}

/// A turn whose user message is already in the history and whose request
/// has not completed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub seq: u64,
    pub request: QuestionRequest,
}

pub struct Session {
    conversation: Conversation,
    transport: Arc<dyn Transport>,
    in_flight: Option<u64>,
    next_seq: u64,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            conversation: Conversation::new(),
            transport,
            in_flight: None,
            next_seq: 1,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Send one question and append its reply.
    ///
    /// Returns `None` for blank input or while another turn is in flight;
    /// otherwise the assistant message that was appended, which is the
    /// fallback message if anything went wrong. Never fails.
    pub async fn send(&mut self, question: &str, choices: &[String]) -> Option<Message> {
        let pending = match self.begin_turn(question, choices) {
            Ok(Some(pending)) => pending,
            Ok(None) => return None,
            Err(e) => {
                warn!("Ignoring question: {}", e);
                return None;
            }
        };

        let outcome = self.transport.post_question(&pending.request).await;
        self.complete_turn(&pending, outcome)
    }

    /// Validate the question, append the user message and mark the turn in
    /// flight. Blank questions are ignored (`Ok(None)`), a second turn while
    /// one is outstanding is rejected.
    pub fn begin_turn(
        &mut self,
        question: &str,
        choices: &[String],
    ) -> Result<Option<PendingTurn>, SessionError> {
        if question.trim().is_empty() {
            return Ok(None);
        }

        if let Some(outstanding) = self.in_flight {
            return Err(SessionError::Busy { outstanding });
        }

        self.conversation.append(Message::user(question));

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);

        let request = QuestionRequest::new(question, choices);
        info!(
            seq,
            answers = request.answers.as_ref().map_or(0, Vec::len),
            "Question submitted"
        );

        Ok(Some(PendingTurn { seq, request }))
    }

    /// Finish a turn with the transport outcome.
    ///
    /// Failures are logged and replaced by [`fallback_message`]. A completion
    /// for a turn that is no longer outstanding is dropped.
    pub fn complete_turn(
        &mut self,
        pending: &PendingTurn,
        outcome: ChatResult<RawResponse>,
    ) -> Option<Message> {
        if self.in_flight != Some(pending.seq) {
            warn!(
                seq = pending.seq,
                outstanding = ?self.in_flight,
                "Discarding stale reply"
            );
            return None;
        }

        let message = match outcome.and_then(|response| interpret(&response)) {
            Ok(message) => {
                debug!(seq = pending.seq, chars = message.content().chars().count(), "Reply received");
                message
            }
            Err(e) => {
                error!(seq = pending.seq, "Error sending question: {}", e);
                fallback_message()
            }
        };

        self.conversation.append(message.clone());
        self.in_flight = None;
        Some(message)
    }
}

fn interpret(response: &RawResponse) -> ChatResult<Message> {
    if !response.is_success() {
        return Err(ChatError::status(response.status, response.body.clone()));
    }
    Ok(normalize(response)?.into_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockTransport;
    use crate::chat::{Difficulty, Role};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn session_with(mock: MockTransport) -> Session {
        Session::new(Arc::new(mock))
    }

    fn offline() -> ChatError {
        ChatError::Config("offline".to_string())
    }

    #[tokio::test]
    async fn test_recyclable_example() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .withf(|request| {
                request.question == "What is recyclable?" && request.answers.is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    r#"{"output": "Plastics #1 and #2.", "modelo": "gpt-4", "difficulty": "easy", "category": "recycling"}"#,
                ))
            });

        let mut session = session_with(mock);
        let reply = session.send("What is recyclable?", &[]).await;

        let expected = vec![
            Message::user("What is recyclable?"),
            Message::assistant("Plastics #1 and #2.")
                .with_modelo("gpt-4")
                .with_difficulty("easy")
                .with_category("recycling"),
        ];
        assert_eq!(session.conversation().all(), expected.as_slice());
        assert_eq!(reply.as_ref(), expected.last());
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_fallback() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .times(1)
            .returning(|_| Err(offline()));

        let mut session = session_with(mock);
        session.send("What is recyclable?", &[]).await;

        let messages = session.conversation().all();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("What is recyclable?"));
        assert_eq!(messages[1], fallback_message());
        assert_eq!(messages[1].content(), FALLBACK_CONTENT);
        assert_eq!(messages[1].modelo(), Some(FALLBACK_MODELO));
        assert_eq!(
            messages[1].difficulty(),
            Some(&Difficulty::Label(FALLBACK_DIFFICULTY.to_string()))
        );
        assert_eq!(messages[1].category(), Some(FALLBACK_CATEGORY));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_error_status_yields_fallback() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .times(1)
            .returning(|_| Ok(RawResponse::new(500, Some("application/json"), r#"{"output": "partial"}"#)));

        let mut session = session_with(mock);
        let reply = session.send("Is glass recyclable?", &[]).await;

        assert_eq!(reply, Some(fallback_message()));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_malformed_json_yields_fallback() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .returning(|_| Ok(RawResponse::json("{oops")));

        let mut session = session_with(mock);
        let reply = session.send("q", &[]).await;

        assert_eq!(reply, Some(fallback_message()));
    }

    #[tokio::test]
    async fn test_blank_input_is_noop() {
        let mut mock = MockTransport::new();
        mock.expect_post_question().never();

        let mut session = session_with(mock);
        for input in ["", "   ", "\n\t "] {
            assert_eq!(session.send(input, &["a".to_string()]).await, None);
        }

        assert!(session.conversation().is_empty());
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_answer_choices_are_cleaned() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .withf(|request| {
                request.answers == Some(vec!["Paper".to_string(), "Glass".to_string()])
            })
            .times(1)
            .returning(|_| Ok(RawResponse::text("Glass")));

        let mut session = session_with(mock);
        let choices = vec![" Paper ".to_string(), "  ".to_string(), "Glass".to_string()];
        let reply = session.send("Which is infinitely recyclable?", &choices).await;

        assert_eq!(reply, Some(Message::assistant("Glass")));
    }

    #[tokio::test]
    async fn test_user_message_keeps_raw_text() {
        let mut mock = MockTransport::new();
        mock.expect_post_question()
            .returning(|_| Ok(RawResponse::text("ok")));

        let mut session = session_with(mock);
        session.send("  padded question  ", &[]).await;

        assert_eq!(session.conversation().all()[0].content(), "  padded question  ");
    }

    #[test]
    fn test_user_turn_is_appended_before_request_completes() {
        let mut session = session_with(MockTransport::new());

        let pending = session.begin_turn("What is recyclable?", &[]).unwrap().unwrap();

        assert!(session.is_in_flight());
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation().all()[0].role(), Role::User);
        assert_eq!(pending.request.question, "What is recyclable?");

        let reply = session.complete_turn(&pending, Ok(RawResponse::text("Cardboard.")));
        assert_eq!(reply, Some(Message::assistant("Cardboard.")));
        assert_eq!(session.conversation().len(), 2);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_second_turn_rejected_while_in_flight() {
        let mut session = session_with(MockTransport::new());

        let first = session.begin_turn("one", &[]).unwrap().unwrap();
        assert_matches!(
            session.begin_turn("two", &[]),
            Err(SessionError::Busy { outstanding }) if outstanding == first.seq
        );
        assert_eq!(session.conversation().len(), 1);

        session.complete_turn(&first, Ok(RawResponse::text("1")));
        let second = session.begin_turn("two", &[]).unwrap().unwrap();
        assert!(second.seq > first.seq);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut session = session_with(MockTransport::new());

        let first = session.begin_turn("one", &[]).unwrap().unwrap();
        session.complete_turn(&first, Ok(RawResponse::text("1")));
        let second = session.begin_turn("two", &[]).unwrap().unwrap();

        assert_eq!(session.complete_turn(&first, Ok(RawResponse::text("late"))), None);
        assert!(session.is_in_flight());
        assert_eq!(session.conversation().len(), 3);

        session.complete_turn(&second, Ok(RawResponse::text("2")));
        let contents: Vec<&str> = session
            .conversation()
            .all()
            .iter()
            .map(Message::content)
            .collect();
        assert_eq!(contents, vec!["one", "1", "two", "2"]);
    }

    #[tokio::test]
    async fn test_turns_alternate_across_sends() {
        let mut mock = MockTransport::new();
        let mut counter = 0;
        mock.expect_post_question().times(3).returning(move |_| {
            counter += 1;
            Ok(RawResponse::text(format!("reply {}", counter)))
        });

        let mut session = session_with(mock);
        for q in ["a", "b", "c"] {
            session.send(q, &[]).await;
        }

        let roles: Vec<Role> = session.conversation().all().iter().map(Message::role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(session.conversation().last().unwrap().content(), "reply 3");
    }
}
