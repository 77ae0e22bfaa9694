// Defaults loaded from the environment (a .env file is read in main before first use).

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;

/// Shown to the user whenever a generation fails.
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Prompt shown by renderers that have nothing to display yet.
pub const PLACEHOLDER_MESSAGE: &str = "Please write something specific to get some great ideas!";

/// Starter prompts offered while the chat is empty.
pub const SUGGESTED_TOPICS: [&str; 6] = [
    "Healthy meal planning",
    "Business startup ideas",
    "DIY home improvement projects",
    "Fitness workout routines",
    "Book recommendations",
    "Travel destinations",
];

pub const SAVE_CONFIRMATION_MESSAGE: &str =
    "I've saved that idea for you! Feel free to generate another one.";

pub const NOTHING_TO_SAVE_MESSAGE: &str =
    "There is no idea to save yet. Ask me for some ideas first.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI idea generation assistant.
1. For idea generation requests: reply with a JSON array of strings. Each string is one innovative, practical idea of 3-4 sentences.
2. For requests to save, store, remember or keep the last idea: reply with exactly SAVE_INTENT and nothing else.
3. For any other request: reply with a short natural response.
Use plain text inside each idea, without markdown or special characters.";

lazy_static::lazy_static! {
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();
    pub static ref OPENAI_BASE_URL: String = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    pub static ref OLLAMA_URL: String = env::var("OLLAMA_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
    pub static ref CHAT_MODEL: String = env::var("IDEAGEN_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
    pub static ref SYSTEM_PROMPT: String = env::var("IDEAGEN_SYSTEM_PROMPT").unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string());
    pub static ref GATEWAY_URL: String = env::var("IDEAGEN_SERVER").unwrap_or_else(|_| format!("http://127.0.0.1:{}", DEFAULT_PORT));
    pub static ref DATA_DIR: PathBuf = env::var("IDEAGEN_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .map(|dir| dir.join("ideagen"))
                .unwrap_or_else(|| PathBuf::from(".ideagen"))
        });
}
