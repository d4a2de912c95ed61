pub mod auth;
pub mod chat;

pub use auth::{ RegisterRequest, TokenResponse, UserProfile };
pub use chat::{ ChatRequest, ChatResponse, ConversationId, Message, Sender };
