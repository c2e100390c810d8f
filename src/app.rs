use chrono::{DateTime, Local, Utc};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::backend::{BackendClient, QueryError, QueryReply};
use crate::conversation::{Evaluation, Turn};

/// Pre-filled questions offered on the welcome card.
pub const SUGGESTIONS: &[&str] = &[
    "What are the early symptoms of type 2 diabetes?",
    "How does insulin regulate blood sugar?",
    "Which foods should I avoid with high blood sugar?",
    "What is the difference between type 1 and type 2 diabetes?",
];

/// Shown for any failed request, HTTP and transport failures alike.
pub const BACKEND_ERROR_MESSAGE: &str =
    "Sorry, the answering service could not be reached. Make sure the backend is running, then try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Welcome,
    Transcript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One rendered message. Unlike a [`Turn`], this includes optimistic user
/// messages and error replies, neither of which is ever persisted.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub evaluation: Option<Evaluation>,
    pub is_error: bool,
    pub time: DateTime<Local>,
}

impl TranscriptEntry {
    fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: text.to_string(),
            evaluation: None,
            is_error: false,
            time: Local::now(),
        }
    }

    fn assistant(text: &str, evaluation: Option<Evaluation>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.to_string(),
            evaluation,
            is_error: false,
            time: Local::now(),
        }
    }

    fn error(text: &str) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(text, None)
        }
    }
}

struct PendingQuery {
    question: String,
    task: JoinHandle<Result<QueryReply, QueryError>>,
}

pub struct App {
    pub should_quit: bool,
    pub view: View,

    // Conversation state: `conversation` is what gets persisted,
    // `transcript` is what gets drawn.
    pub conversation: Vec<Turn>,
    pub transcript: Vec<TranscriptEntry>,

    // Guard against concurrent sends. True from submit until the reply
    // (or failure) has been folded into the transcript.
    pub processing: bool,
    pending: Option<PendingQuery>,

    // Input editing
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Transcript scrolling
    pub scroll: u16,
    pub chat_height: u16, // inner chat size, updated during render
    pub chat_width: u16,

    // Welcome card suggestion list
    pub suggestion_state: ListState,

    // Clear-conversation confirmation dialog
    pub show_clear_confirm: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: BackendClient,
}

impl App {
    pub fn new(client: BackendClient) -> Self {
        let mut suggestion_state = ListState::default();
        suggestion_state.select(Some(0));

        Self {
            should_quit: false,
            view: View::Welcome,
            conversation: Vec::new(),
            transcript: Vec::new(),
            processing: false,
            pending: None,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            suggestion_state,
            show_clear_confirm: false,
            animation_frame: 0,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Send a question to the backend.
    ///
    /// A no-op when the trimmed question is empty or a request is already
    /// in flight; the question is neither queued nor retried.
    pub fn submit(&mut self, question: &str) {
        let question = question.trim();
        if question.is_empty() || self.processing {
            return;
        }

        self.begin_turn(question);

        let client = self.client.clone();
        let task_question = question.to_string();
        self.pending = Some(PendingQuery {
            question: task_question.clone(),
            task: tokio::spawn(async move { client.query(&task_question).await }),
        });
    }

    /// Entry half of a turn: view transition, optimistic user message,
    /// input reset, processing guard up.
    fn begin_turn(&mut self, question: &str) {
        if self.view == View::Welcome {
            self.view = View::Transcript;
        }

        self.transcript.push(TranscriptEntry::user(question));
        self.input.clear();
        self.cursor = 0;
        self.processing = true;
        self.scroll_to_bottom();
    }

    /// Exit half of a turn: fold the reply (or failure) into the
    /// transcript and drop the processing guard. Runs on every path.
    fn finish_turn(&mut self, question: String, result: Result<QueryReply, QueryError>) {
        self.processing = false;

        match result {
            Ok(reply) => {
                self.transcript
                    .push(TranscriptEntry::assistant(&reply.answer, reply.evaluation.clone()));
                self.conversation.push(Turn {
                    question,
                    answer: reply.answer,
                    evaluation: reply.evaluation,
                    timestamp: Utc::now(),
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "query failed");
                self.transcript.push(TranscriptEntry::error(BACKEND_ERROR_MESSAGE));
            }
        }

        self.scroll_to_bottom();
    }

    /// Check the in-flight request and, once it has settled, complete the
    /// turn. Called from the event loop; returns immediately while the
    /// request is still running.
    pub async fn poll_pending(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|p| p.task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(pending) = self.pending.take() {
            let result = match pending.task.await {
                Ok(result) => result,
                Err(join_err) => Err(QueryError::from(join_err)),
            };
            self.finish_turn(pending.question, result);
        }
    }

    /// Ask to clear the conversation. No dialog when there is nothing to
    /// clear.
    pub fn request_clear(&mut self) {
        if self.conversation.is_empty() {
            return;
        }
        self.show_clear_confirm = true;
    }

    pub fn confirm_clear(&mut self) {
        self.show_clear_confirm = false;
        self.transcript.clear();
        self.conversation.clear();
        self.view = View::Welcome;
        self.input.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn cancel_clear(&mut self) {
        self.show_clear_confirm = false;
    }

    /// Replay previously saved turns into the transcript. Only invoked
    /// explicitly (`--restore`); an empty history leaves the welcome view.
    pub fn restore(&mut self, turns: Vec<Turn>) {
        if turns.is_empty() {
            return;
        }

        self.view = View::Transcript;
        for turn in &turns {
            let time = turn.timestamp.with_timezone(&Local);
            self.transcript.push(TranscriptEntry {
                time,
                ..TranscriptEntry::user(&turn.question)
            });
            self.transcript.push(TranscriptEntry {
                time,
                ..TranscriptEntry::assistant(&turn.answer, turn.evaluation.clone())
            });
        }
        self.conversation = turns;
        self.scroll_to_bottom();
    }

    // Suggestion list navigation
    pub fn suggestion_down(&mut self) {
        let len = SUGGESTIONS.len();
        if len > 0 {
            let i = self.suggestion_state.selected().unwrap_or(0);
            self.suggestion_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn suggestion_up(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0);
        self.suggestion_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_suggestion(&self) -> Option<&'static str> {
        self.suggestion_state
            .selected()
            .and_then(|i| SUGGESTIONS.get(i).copied())
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.processing {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.total_lines().saturating_sub(self.chat_height) {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.chat_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        let max_scroll = self.total_lines().saturating_sub(self.chat_height);
        self.scroll = (self.scroll + self.chat_height / 2).min(max_scroll);
    }

    pub fn scroll_to_bottom(&mut self) {
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.scroll = self.total_lines().saturating_sub(visible);
    }

    /// Estimate rendered transcript height, mirroring the layout the
    /// renderer produces: role line, wrapped content, meta line, blank.
    fn total_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;

        for entry in &self.transcript {
            total += 1; // role line ("You:" or "AI:")
            for line in entry.text.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total += 2; // meta line + blank line after message
        }

        if self.processing {
            total += 2; // "AI:" + "Thinking..."
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::collections::BTreeMap;

    fn test_app() -> App {
        App::new(BackendClient::new("http://127.0.0.1:8000"))
    }

    fn reply(answer: &str, score: Option<f64>) -> QueryReply {
        QueryReply {
            answer: answer.to_string(),
            evaluation: score.map(|global_score| Evaluation {
                global_score,
                metrics: BTreeMap::new(),
            }),
        }
    }

    #[test]
    fn test_submit_whitespace_is_noop() {
        let mut app = test_app();
        app.submit("   \n  ");
        assert!(!app.processing);
        assert!(app.transcript.is_empty());
        assert!(app.conversation.is_empty());
        assert_eq!(app.view, View::Welcome);
    }

    #[test]
    fn test_submit_while_processing_is_noop() {
        let mut app = test_app();
        app.begin_turn("first");
        let transcript_len = app.transcript.len();

        app.submit("second");
        assert_eq!(app.transcript.len(), transcript_len);
        assert!(app.conversation.is_empty());
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_first_turn_switches_to_transcript_view() {
        let mut app = test_app();
        assert_eq!(app.view, View::Welcome);

        app.begin_turn("hello");
        assert_eq!(app.view, View::Transcript);
        assert!(app.processing);
        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0].role, Role::User);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_successful_turn_resets_flag_and_records_turn() {
        let mut app = test_app();
        app.begin_turn("What is insulin?");
        assert!(app.processing);

        app.finish_turn(
            "What is insulin?".to_string(),
            Ok(reply("Hi", Some(0.85))),
        );

        assert!(!app.processing);
        assert_eq!(app.transcript.len(), 2);

        let answer = &app.transcript[1];
        assert_eq!(answer.role, Role::Assistant);
        assert!(!answer.is_error);
        let eval = answer.evaluation.as_ref().unwrap();
        assert_eq!(eval.badge(), "✓ Score: 85%");

        assert_eq!(app.conversation.len(), 1);
        assert_eq!(app.conversation[0].question, "What is insulin?");
        assert_eq!(app.conversation[0].answer, "Hi");
    }

    #[test]
    fn test_failed_turn_renders_error_but_is_not_recorded() {
        let mut app = test_app();
        app.begin_turn("q");

        app.finish_turn(
            "q".to_string(),
            Err(QueryError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        );

        assert!(!app.processing);
        assert_eq!(app.transcript.len(), 2);

        let error = &app.transcript[1];
        assert_eq!(error.role, Role::Assistant);
        assert!(error.is_error);
        assert!(error.evaluation.is_none());
        assert_eq!(error.text, BACKEND_ERROR_MESSAGE);

        // Failed exchanges never become Turns.
        assert!(app.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_poll_pending_handles_task_panic() {
        let mut app = test_app();
        app.begin_turn("q");
        app.pending = Some(PendingQuery {
            question: "q".to_string(),
            task: tokio::spawn(async { panic!("boom") }),
        });

        // Wait for the task to settle before polling.
        while !app.pending.as_ref().unwrap().task.is_finished() {
            tokio::task::yield_now().await;
        }

        app.poll_pending().await;
        assert!(!app.processing);
        assert!(app.pending.is_none());
        assert!(app.transcript.last().unwrap().is_error);
    }

    #[test]
    fn test_clear_on_empty_conversation_shows_no_dialog() {
        let mut app = test_app();
        app.request_clear();
        assert!(!app.show_clear_confirm);
    }

    #[test]
    fn test_clear_confirm_empties_everything() {
        let mut app = test_app();
        app.begin_turn("q");
        app.finish_turn("q".to_string(), Ok(reply("a", None)));

        app.request_clear();
        assert!(app.show_clear_confirm);

        app.confirm_clear();
        assert!(app.transcript.is_empty());
        assert!(app.conversation.is_empty());
        assert_eq!(app.view, View::Welcome);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_clear_cancel_leaves_state_unchanged() {
        let mut app = test_app();
        app.begin_turn("q");
        app.finish_turn("q".to_string(), Ok(reply("a", None)));

        app.request_clear();
        app.cancel_clear();
        assert!(!app.show_clear_confirm);
        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.conversation.len(), 1);
        assert_eq!(app.view, View::Transcript);
    }

    #[test]
    fn test_restore_replays_turns() {
        let mut app = test_app();
        let turns = vec![
            Turn {
                question: "q1".to_string(),
                answer: "a1".to_string(),
                evaluation: Some(Evaluation {
                    global_score: 0.55,
                    metrics: BTreeMap::new(),
                }),
                timestamp: Utc::now(),
            },
            Turn {
                question: "q2".to_string(),
                answer: "a2".to_string(),
                evaluation: None,
                timestamp: Utc::now(),
            },
        ];

        app.restore(turns);
        assert_eq!(app.view, View::Transcript);
        assert_eq!(app.conversation.len(), 2);
        assert_eq!(app.transcript.len(), 4);
        assert_eq!(app.transcript[0].role, Role::User);
        assert_eq!(app.transcript[1].role, Role::Assistant);
        assert!(app.transcript[1].evaluation.is_some());
    }

    #[test]
    fn test_restore_empty_keeps_welcome_view() {
        let mut app = test_app();
        app.restore(Vec::new());
        assert_eq!(app.view, View::Welcome);
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn test_suggestion_navigation_clamps() {
        let mut app = test_app();
        assert_eq!(app.suggestion_state.selected(), Some(0));

        app.suggestion_up();
        assert_eq!(app.suggestion_state.selected(), Some(0));

        for _ in 0..SUGGESTIONS.len() + 2 {
            app.suggestion_down();
        }
        assert_eq!(app.suggestion_state.selected(), Some(SUGGESTIONS.len() - 1));
        assert!(app.selected_suggestion().is_some());
    }
}
