use log::{ error, info, warn };
use std::sync::Arc;

use super::state::{ reduce, ChatEvent, ChatState, Effect };
use crate::api::Backend;
use crate::session::{ SessionError, SessionStore };

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing was sent: blank input or a request already in flight.
    Ignored,
    Replied,
    Failed,
    /// The backend rejected the credential; the session has been cleared.
    SessionExpired {
        message: String,
    },
}

/// Drives [`ChatState`] through the request/response cycle against a [`Backend`].
pub struct ConversationController {
    state: ChatState,
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
}

impl ConversationController {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            state: ChatState::for_session(session.generation()),
            backend,
            session,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn dispatch(&mut self, event: ChatEvent) -> Option<Effect> {
        let current = std::mem::take(&mut self.state);
        let (next, effect) = reduce(current, event);
        self.state = next;
        effect
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.dispatch(ChatEvent::InputChanged(text.into()));
    }

    /// Resets the thread when the session has been replaced since the log was started.
    pub fn sync_identity(&mut self) {
        let generation = self.session.generation();
        self.dispatch(ChatEvent::SessionChanged(generation));
    }

    /// Applies the submit locally (optimistic user message) and returns the request to issue.
    pub fn start_turn(&mut self) -> Option<Effect> {
        self.dispatch(ChatEvent::Submit)
    }

    pub async fn submit(&mut self) -> TurnOutcome {
        match self.start_turn() {
            Some(effect) => self.complete(effect).await,
            None => TurnOutcome::Ignored,
        }
    }

    pub async fn send(&mut self, text: impl Into<String>) -> TurnOutcome {
        self.set_input(text);
        self.submit().await
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        let result = self.session.logout();
        self.sync_identity();
        result
    }

    pub async fn complete(&mut self, effect: Effect) -> TurnOutcome {
        let Effect::SendMessage { turn, request } = effect;
        let credential = self.session.credential();

        match self.backend.send_chat_message(credential.as_deref(), &request).await {
            Ok(response) => {
                info!("Reply received for conversation {}", response.conversation_id);
                self.dispatch(ChatEvent::ResponseReceived { turn, response });
                TurnOutcome::Replied
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Chat request rejected, ending session: {}", e);
                let message = e.user_message();
                self.dispatch(ChatEvent::RequestFailed { turn, message: message.clone() });
                if let Err(clear_err) = self.logout() {
                    warn!("Could not clear session: {}", clear_err);
                }
                TurnOutcome::SessionExpired { message }
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                self.dispatch(ChatEvent::RequestFailed { turn, message: e.user_message() });
                TurnOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ status_error, ScriptedBackend };
    use crate::models::{ ChatResponse, ConversationId, Sender, UserProfile };
    use crate::session::storage::{ CredentialStorage, MemoryStorage, TOKEN_KEY };
    use serde_json::json;

    fn signed_in(storage: Arc<MemoryStorage>) -> Arc<SessionStore> {
        let session = Arc::new(SessionStore::new(storage));
        session.login("tok", UserProfile::named("alice")).unwrap();
        session
    }

    fn reply(text: &str, id: i64) -> ChatResponse {
        ChatResponse { ai_response: text.into(), conversation_id: ConversationId::Number(id) }
    }

    #[tokio::test]
    async fn turn_round_trip_threads_conversation() {
        let backend = Arc::new(
            ScriptedBackend::new().on_chat(Ok(reply("hi", 7))).on_chat(Ok(reply("sure", 7)))
        );
        let session = signed_in(Arc::new(MemoryStorage::new()));
        let mut controller = ConversationController::new(backend.clone(), session);

        assert_eq!(controller.send("hello").await, TurnOutcome::Replied);
        assert_eq!(controller.send("and then?").await, TurnOutcome::Replied);

        let calls = backend.calls_to("chat");
        assert_eq!(calls[0].credential.as_deref(), Some("tok"));
        assert_eq!(calls[0].body, Some(json!({ "user_message": "hello", "conversation_id": null })));
        assert_eq!(
            calls[1].body,
            Some(json!({ "user_message": "and then?", "conversation_id": 7 }))
        );

        let senders: Vec<Sender> = controller
            .state()
            .messages.iter()
            .map(|m| m.sender)
            .collect();
        assert_eq!(senders, vec![Sender::User, Sender::Ai, Sender::User, Sender::Ai]);
    }

    #[tokio::test]
    async fn blank_input_sends_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        let session = signed_in(Arc::new(MemoryStorage::new()));
        let mut controller = ConversationController::new(backend.clone(), session);

        assert_eq!(controller.send("   ").await, TurnOutcome::Ignored);
        assert!(backend.calls().is_empty());
        assert!(controller.state().messages.is_empty());
    }

    #[tokio::test]
    async fn backend_error_becomes_banner() {
        let backend = Arc::new(
            ScriptedBackend::new().on_chat(Err(status_error(500, "An internal server error occurred.")))
        );
        let session = signed_in(Arc::new(MemoryStorage::new()));
        let mut controller = ConversationController::new(backend, session.clone());

        assert_eq!(controller.send("hello").await, TurnOutcome::Failed);

        let state = controller.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.error.as_deref(), Some("An internal server error occurred."));
        assert!(!state.sending);
        assert!(session.credential().is_some());
    }

    #[tokio::test]
    async fn unauthorized_reply_ends_session() {
        let storage = Arc::new(MemoryStorage::new());
        let backend = Arc::new(
            ScriptedBackend::new().on_chat(Err(status_error(401, "Could not validate credentials")))
        );
        let session = signed_in(storage.clone());
        let mut controller = ConversationController::new(backend, session.clone());

        let outcome = controller.send("hello").await;

        assert_eq!(outcome, TurnOutcome::SessionExpired {
            message: "Could not validate credentials".into(),
        });
        assert_eq!(session.credential(), None);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert!(controller.state().messages.is_empty());
    }

    #[tokio::test]
    async fn logout_empties_the_thread() {
        let storage = Arc::new(MemoryStorage::new());
        let backend = Arc::new(ScriptedBackend::new().on_chat(Ok(reply("hi", 1))));
        let session = signed_in(storage.clone());
        let mut controller = ConversationController::new(backend, session);
        controller.send("hello").await;

        controller.logout().unwrap();

        let state = controller.state();
        assert!(state.messages.is_empty());
        assert_eq!(state.conversation_id, None);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn new_login_starts_fresh_thread() {
        let backend = Arc::new(ScriptedBackend::new().on_chat(Ok(reply("hi", 1))));
        let session = signed_in(Arc::new(MemoryStorage::new()));
        let mut controller = ConversationController::new(backend, session.clone());
        controller.send("hello").await;

        session.login("tok-2", UserProfile::named("bob")).unwrap();
        controller.sync_identity();

        assert!(controller.state().messages.is_empty());
        assert_eq!(controller.state().session, session.generation());
    }

    #[tokio::test]
    async fn same_user_signing_in_again_starts_fresh_thread() {
        let backend = Arc::new(ScriptedBackend::new().on_chat(Ok(reply("hi", 1))));
        let session = signed_in(Arc::new(MemoryStorage::new()));
        let mut controller = ConversationController::new(backend, session.clone());
        controller.send("hello").await;

        session.login("tok-2", UserProfile::named("alice")).unwrap();
        controller.sync_identity();

        assert!(controller.state().messages.is_empty());
        assert_eq!(controller.state().conversation_id, None);
    }
}
