use std::fmt::Display;

use shared::llm::{APOLOGY_MESSAGE, WELCOME_MESSAGE};
use shared::models::{Conversation, Turn};
use tracing::error;

use crate::transport::ChatTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// The whole reply arrives at once and replaces the placeholder.
    Batch,
    /// The reply arrives in pieces that are appended to the placeholder.
    Streaming,
}

impl ResponseMode {
    pub const fn from_stream_flag(stream: bool) -> Self {
        if stream {
            Self::Streaming
        } else {
            Self::Batch
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::Streaming => "stream",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub const fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    pub const fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }

    pub const fn char(value: char) -> Self {
        Self {
            key: Key::Char(value),
            shift: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The caller should send the draft now.
    Submit,
    Edited,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Busy, or nothing but whitespace in the draft.
    Ignored,
    Replied,
    Failed,
}

/// Everything the transport needs for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub history: Vec<Turn>,
}

/// In-memory state of one chat widget.
///
/// At most one send is in flight. While it is, the input is locked and the
/// assistant placeholder appended by [`ChatSession::begin_send`] is the only
/// turn that can change.
#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation: Conversation,
    draft: String,
    busy: bool,
    placeholder: Option<usize>,
    mode: ResponseMode,
}

impl ChatSession {
    pub fn new(mode: ResponseMode) -> Self {
        Self::with_turns(vec![Turn::assistant(WELCOME_MESSAGE)], mode)
    }

    pub fn with_turns(turns: Vec<Turn>, mode: ResponseMode) -> Self {
        Self {
            conversation: Conversation::new(turns),
            draft: String::new(),
            busy: false,
            placeholder: None,
            mode,
        }
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn turns(&self) -> &[Turn] {
        self.conversation.as_slice()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Replaces the draft. Ignored while a send is in flight.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if !self.busy {
            self.draft = text.into();
        }
    }

    pub fn handle_key(&mut self, press: KeyPress) -> KeyOutcome {
        if self.busy {
            return KeyOutcome::Ignored;
        }

        match press.key {
            Key::Enter if !press.shift => KeyOutcome::Submit,
            Key::Enter => {
                self.draft.push('\n');
                KeyOutcome::Edited
            }
            Key::Char(value) => {
                self.draft.push(value);
                KeyOutcome::Edited
            }
            Key::Other => KeyOutcome::Ignored,
        }
    }

    /// Moves from idle to sending: takes the draft, appends the user turn and
    /// an empty assistant placeholder, and returns the history to send.
    pub fn begin_send(&mut self) -> Option<PendingSend> {
        if self.busy || self.draft.trim().is_empty() {
            return None;
        }

        let content = std::mem::take(&mut self.draft);
        self.busy = true;
        self.conversation.push(Turn::user(content));
        let history = self.conversation.as_slice().to_vec();
        self.placeholder = Some(self.conversation.len());
        self.conversation.push(Turn::assistant(""));

        Some(PendingSend { history })
    }

    /// Streaming success path.
    pub fn apply_chunk(&mut self, text: &str) {
        if let Some(placeholder) = self.placeholder_mut() {
            placeholder.content.push_str(text);
        }
    }

    /// Batch success path.
    pub fn complete(&mut self, text: String) {
        if let Some(placeholder) = self.placeholder_mut() {
            placeholder.content = text;
        }
    }

    /// The placeholder keeps whatever it already holds; the apology goes after it.
    pub fn fail(&mut self, err: &dyn Display) {
        if !self.busy {
            return;
        }
        error!(error = %err, "chat send failed");
        self.placeholder = None;
        self.conversation.push(Turn::assistant(APOLOGY_MESSAGE));
    }

    pub fn finish(&mut self) {
        self.busy = false;
        self.placeholder = None;
    }

    pub async fn send<T>(&mut self, transport: &T) -> SendOutcome
    where
        T: ChatTransport + ?Sized,
    {
        self.send_with(transport, |_| {}).await
    }

    /// Runs one full send. `on_chunk` sees every streamed piece as it lands.
    pub async fn send_with<T, F>(&mut self, transport: &T, mut on_chunk: F) -> SendOutcome
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&str) + Send,
    {
        let Some(pending) = self.begin_send() else {
            return SendOutcome::Ignored;
        };

        let result = match self.mode {
            ResponseMode::Batch => transport
                .fetch_reply(&pending.history)
                .await
                .map(|text| self.complete(text)),
            ResponseMode::Streaming => {
                let mut sink = |chunk: &str| {
                    self.apply_chunk(chunk);
                    on_chunk(chunk);
                };
                transport.stream_reply(&pending.history, &mut sink).await
            }
        };

        let outcome = match result {
            Ok(()) => SendOutcome::Replied,
            Err(err) => {
                self.fail(&err);
                SendOutcome::Failed
            }
        };
        self.finish();
        outcome
    }

    fn placeholder_mut(&mut self) -> Option<&mut Turn> {
        let index = self.placeholder?;
        self.conversation.get_mut(index)
    }
}
