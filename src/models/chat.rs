use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One entry of the chat log. Ordering is positional; `sent_at` is display metadata only.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Backend-minted conversation handle. Never built or inspected client-side, only echoed back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Number(n) => write!(f, "{}", n),
            ConversationId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    pub conversation_id: Option<ConversationId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub ai_response: String,
    pub conversation_id: ConversationId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversation_id_keeps_its_wire_shape() {
        let numeric: ChatResponse = serde_json
            ::from_value(json!({ "ai_response": "hi", "conversation_id": 42 }))
            .unwrap();
        assert_eq!(numeric.conversation_id, ConversationId::Number(42));

        let request = ChatRequest {
            user_message: "next".into(),
            conversation_id: Some(numeric.conversation_id),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "user_message": "next", "conversation_id": 42 })
        );

        let text: ChatResponse = serde_json
            ::from_value(json!({ "ai_response": "hi", "conversation_id": "c1" }))
            .unwrap();
        assert_eq!(text.conversation_id, ConversationId::Text("c1".into()));
    }

    #[test]
    fn first_request_sends_explicit_null() {
        let request = ChatRequest { user_message: "hello".into(), conversation_id: None };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "user_message": "hello", "conversation_id": null })
        );
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Sender::Ai).unwrap(), json!("ai"));
        assert_eq!(serde_json::to_value(Sender::User).unwrap(), json!("user"));
    }
}
