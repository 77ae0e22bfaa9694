pub mod chat;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod ideas;
pub mod intent;
pub mod llm_interaction;
pub mod model;
pub mod session;
pub mod store;
pub mod web_server;

pub use error::GatewayError;
pub use gateway::Gateway;
pub use model::{ChatRequest, ChatResponse, Conversation, Intent, Role, Turn};
