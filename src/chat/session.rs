use crate::api::{ApiError, ChatQuestion, ChatReply};
use crate::chat::stream::{Reveal, StreamHandle};
use crate::chat::ChatMessage;
use crate::event::{AppEvent, Dispatcher};
use crate::notify::Toasts;
use crate::validation::ValidationError;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const FALLBACK_RESPONSE: &str = "I'm analyzing your project files. I can help you understand the content, extract key information, and answer questions about your documents. What specific aspects would you like to explore?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Pending,
    Streaming,
}

/// Conversation state for one open project.
///
/// Only one request or one stream is in flight at a time. The request and
/// the reveal ticks run on the runtime and come back as `AppEvent`s, which
/// the owner feeds into [`ChatSession::handle_event`].
pub struct ChatSession {
    id: Uuid,
    project_id: String,
    transcript: Vec<ChatMessage>,
    pending_request: bool,
    active_stream: Option<StreamHandle>,
    next_stream_id: u64,
    reveal_tick: Duration,
    dispatcher: Dispatcher,
}

impl ChatSession {
    pub fn new(project_id: impl Into<String>, dispatcher: Dispatcher, reveal_tick: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            transcript: Vec::new(),
            pending_request: false,
            active_stream: None,
            next_stream_id: 0,
            reveal_tick,
            dispatcher,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn phase(&self) -> SessionPhase {
        if self.active_stream.is_some() {
            SessionPhase::Streaming
        } else if self.pending_request {
            SessionPhase::Pending
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != SessionPhase::Idle
    }

    #[cfg(test)]
    pub fn active_stream_id(&self) -> Option<u64> {
        self.active_stream.as_ref().map(|stream| stream.id)
    }

    /// Appends the user message right away and sends it to the assistant.
    pub fn submit_message(&mut self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.is_busy() {
            return Err(ValidationError::Busy);
        }

        self.transcript.push(ChatMessage::user(text));
        self.pending_request = true;

        let session = self.id;
        let question = ChatQuestion {
            project_id: self.project_id.clone(),
            message: text.to_string(),
        };
        info!(%session, project_id = %self.project_id, "submitting chat message");
        self.dispatcher.spawn_request(move |api| async move {
            AppEvent::ChatReplied {
                session,
                result: api.ask_bot(question).await,
            }
        });
        Ok(())
    }

    /// Applies events addressed to this session. Returns `false` for events
    /// that belong elsewhere.
    pub fn handle_event(&mut self, event: AppEvent, toasts: &mut Toasts) -> bool {
        match event {
            AppEvent::ChatReplied { session, result } if session == self.id => {
                self.on_reply(result, toasts);
                true
            }
            AppEvent::RevealTick { session, stream } if session == self.id => {
                self.on_tick(stream);
                true
            }
            _ => false,
        }
    }

    fn on_reply(&mut self, result: Result<ChatReply, ApiError>, toasts: &mut Toasts) {
        if !self.pending_request {
            debug!(session = %self.id, "ignoring reply with no request pending");
            return;
        }
        self.pending_request = false;

        match result {
            Ok(reply) => {
                self.transcript.push(ChatMessage::assistant_placeholder());
                let index = self.transcript.len() - 1;
                self.begin_stream(index, reply.response.as_deref().unwrap_or_default());
            }
            Err(err) => {
                toasts.api_error("ask assistant", &err);
            }
        }
    }

    /// Starts revealing `full_text` into the message at `message_index`,
    /// replacing any stream already running. Empty text reveals the fallback.
    pub fn begin_stream(&mut self, message_index: usize, full_text: &str) {
        self.cancel_stream();

        if message_index >= self.transcript.len() {
            warn!(session = %self.id, message_index, "stream target does not exist");
            return;
        }

        let target = if full_text.is_empty() {
            FALLBACK_RESPONSE
        } else {
            full_text
        };

        self.next_stream_id += 1;
        let stream = self.next_stream_id;
        let session = self.id;
        let ticker = self
            .dispatcher
            .spawn_ticker(self.reveal_tick, move || AppEvent::RevealTick { session, stream });

        debug!(%session, stream, chars = target.chars().count(), "stream started");
        self.pending_request = false;
        self.active_stream = Some(StreamHandle::new(
            stream,
            message_index,
            Reveal::new(target),
            ticker,
        ));
    }

    fn on_tick(&mut self, stream: u64) {
        let Some(handle) = self.active_stream.as_mut() else {
            return;
        };
        if handle.id != stream {
            return;
        }

        if let Some(prefix) = handle.reveal.advance() {
            if let Some(message) = self.transcript.get_mut(handle.message_index) {
                message.text = prefix.to_string();
            }
        }

        if handle.reveal.is_complete() {
            debug!(session = %self.id, stream, "stream finished");
            self.active_stream = None;
            self.pending_request = false;
        }
    }

    /// Stops the active stream, keeping whatever prefix was revealed. No-op
    /// when nothing is streaming.
    pub fn cancel_stream(&mut self) {
        if let Some(handle) = self.active_stream.take() {
            debug!(
                session = %self.id,
                stream = handle.id,
                revealed = handle.reveal.revealed().chars().count(),
                "stream cancelled"
            );
            self.pending_request = false;
        }
    }
}
