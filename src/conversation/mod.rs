mod controller;
mod state;

pub use controller::{ ConversationController, TurnOutcome };
pub use state::{ reduce, ChatEvent, ChatState, Effect };
