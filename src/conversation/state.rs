use crate::models::{ ChatRequest, ChatResponse, ConversationId, Message };

/// State of one chat view. Mutated only through [`reduce`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub input: String,
    pub conversation_id: Option<ConversationId>,
    pub sending: bool,
    pub error: Option<String>,
    /// Session generation the log belongs to.
    pub session: u64,
    /// Index of the newest entry; the view keeps it in sight.
    pub scroll_anchor: Option<usize>,
    pending_turn: Option<u64>,
    next_turn: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    InputChanged(String),
    Submit,
    ResponseReceived {
        turn: u64,
        response: ChatResponse,
    },
    RequestFailed {
        turn: u64,
        message: String,
    },
    SessionChanged(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendMessage {
        turn: u64,
        request: ChatRequest,
    },
}

impl ChatState {
    pub fn for_session(session: u64) -> Self {
        Self { session, ..Self::default() }
    }

    pub fn can_submit(&self) -> bool {
        !self.sending && !self.input.trim().is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.scroll_anchor = Some(self.messages.len() - 1);
    }

    fn settles(&self, turn: u64) -> bool {
        self.sending && self.pending_turn == Some(turn)
    }
}

/// Pure transition function for the chat view.
///
/// Failures use the banner policy: `error` is set and no reply is added to the log. The user's
/// message is appended when the turn starts and is never rolled back.
pub fn reduce(mut state: ChatState, event: ChatEvent) -> (ChatState, Option<Effect>) {
    match event {
        ChatEvent::InputChanged(text) => {
            state.input = text;
            (state, None)
        }
        ChatEvent::Submit => {
            if !state.can_submit() {
                return (state, None);
            }
            let text = state.input.trim().to_string();
            let turn = state.next_turn;
            state.next_turn += 1;
            state.push(Message::user(text.clone()));
            state.input.clear();
            state.error = None;
            state.sending = true;
            state.pending_turn = Some(turn);
            let request = ChatRequest {
                user_message: text,
                conversation_id: state.conversation_id.clone(),
            };
            (state, Some(Effect::SendMessage { turn, request }))
        }
        ChatEvent::ResponseReceived { turn, response } => {
            if !state.settles(turn) {
                return (state, None);
            }
            state.push(Message::ai(response.ai_response));
            state.conversation_id = Some(response.conversation_id);
            state.error = None;
            state.sending = false;
            state.pending_turn = None;
            (state, None)
        }
        ChatEvent::RequestFailed { turn, message } => {
            if !state.settles(turn) {
                return (state, None);
            }
            state.error = Some(message);
            state.sending = false;
            state.pending_turn = None;
            (state, None)
        }
        ChatEvent::SessionChanged(session) => {
            if session == state.session {
                return (state, None);
            }
            let next_turn = state.next_turn;
            let mut fresh = ChatState::for_session(session);
            // turn numbers stay unique so late replies for the old session are dropped
            fresh.next_turn = next_turn;
            (fresh, None)
        }
    }
}
