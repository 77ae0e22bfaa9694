use serde::{Deserialize, Serialize};

use crate::constants::APOLOGY_MESSAGE;
use crate::error::GatewayError;

/// Separator between idea cards inside one assistant turn.
pub const IDEA_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// A non-empty, ordered list of turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation(Vec<Turn>);

impl Conversation {
    pub fn new(turns: Vec<Turn>) -> Result<Self, GatewayError> {
        if turns.is_empty() {
            return Err(GatewayError::InvalidInput(
                "Invalid or empty messages array".to_string(),
            ));
        }
        Ok(Self(turns))
    }

    /// Outbound turn list: the instruction turn followed by this conversation.
    pub fn with_instruction(&self, instruction: &str) -> Vec<Turn> {
        let mut outbound = Vec::with_capacity(self.0.len() + 1);
        outbound.push(Turn::system(instruction));
        outbound.extend(self.0.iter().cloned());
        outbound
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Save,
    Generate,
    Other,
}

/// Request body accepted by `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Turn>,
}

/// Reply envelope of the gateway.
///
/// `content` is `ideas` joined with [`IDEA_SEPARATOR`]; both are omitted for
/// [`Intent::Save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub intent: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ideas: Vec<String>,
}

impl ChatResponse {
    pub fn save() -> Self {
        Self {
            intent: Intent::Save,
            content: None,
            ideas: Vec::new(),
        }
    }

    pub fn generate(ideas: Vec<String>) -> Self {
        Self {
            intent: Intent::Generate,
            content: Some(ideas.join(IDEA_SEPARATOR)),
            ideas,
        }
    }

    pub fn apology() -> Self {
        Self {
            intent: Intent::Other,
            content: Some(APOLOGY_MESSAGE.to_string()),
            ideas: vec![APOLOGY_MESSAGE.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_serialize_lowercase() {
        let turn = Turn::assistant("hi");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({"role": "assistant", "content": "hi"})
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<Turn>(json!({"role": "tool", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_conversation_is_invalid() {
        let err = Conversation::new(Vec::new()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[test]
    fn test_instruction_comes_first() {
        let conversation =
            Conversation::new(vec![Turn::user("one"), Turn::assistant("two")]).unwrap();
        let outbound = conversation.with_instruction("be brief");

        assert_eq!(outbound.len(), 3);
        assert_eq!(outbound[0], Turn::system("be brief"));
        assert_eq!(outbound[1], Turn::user("one"));
        assert_eq!(outbound[2], Turn::assistant("two"));
    }

    #[test]
    fn test_save_response_omits_content() {
        let value = serde_json::to_value(ChatResponse::save()).unwrap();
        assert_eq!(value, json!({"intent": "save"}));
    }

    #[test]
    fn test_generate_response_joins_ideas() {
        let response = ChatResponse::generate(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(response.content.as_deref(), Some("A\n\nB"));
        assert_eq!(response.ideas, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_messages_defaults_to_empty() {
        let request: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.messages.is_empty());
    }
}
