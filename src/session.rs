use anyhow::Result;
use tracing::{debug, info, warn};

use crate::constants::{
    APOLOGY_MESSAGE, NOTHING_TO_SAVE_MESSAGE, PLACEHOLDER_MESSAGE, SAVE_CONFIRMATION_MESSAGE,
};
use crate::ideas::{flatten_idea, split_idea_cards};
use crate::model::{ChatResponse, Intent, Role, Turn, IDEA_SEPARATOR};
use crate::store::{SessionState, SessionStore};

/// Which turns a renderer sends with each submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HistoryMode {
    /// Only the newest user turn.
    #[default]
    LatestOnly,
    /// Every user and assistant turn so far.
    FullHistory,
}

/// Client-side chat state: history, saved ideas and the idea a "save" refers to.
pub struct ChatSession<S: SessionStore> {
    store: S,
    state: SessionState,
    last_idea: Option<String>,
    history_mode: HistoryMode,
}

impl<S: SessionStore> ChatSession<S> {
    pub fn open(store: S, history_mode: HistoryMode) -> Result<Self> {
        let state = store.load()?;
        info!(
            turns = state.chat_history.len(),
            saved = state.saved_ideas.len(),
            ?history_mode,
            "Opened chat session"
        );
        Ok(Self {
            store,
            state,
            last_idea: None,
            history_mode,
        })
    }

    pub fn history(&self) -> &[Turn] {
        &self.state.chat_history
    }

    pub fn saved_ideas(&self) -> &[String] {
        &self.state.saved_ideas
    }

    pub fn last_idea(&self) -> Option<&str> {
        self.last_idea.as_deref()
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.history_mode
    }

    /// Record a user turn and return what to send to the gateway.
    ///
    /// Blank input records nothing and returns `None`.
    pub fn submit_text(&mut self, text: &str) -> Option<Vec<Turn>> {
        if text.trim().is_empty() {
            return None;
        }
        let turn = Turn::user(text);
        self.state.chat_history.push(turn.clone());
        self.persist();

        let outbound = match self.history_mode {
            HistoryMode::LatestOnly => vec![turn],
            HistoryMode::FullHistory => self
                .state
                .chat_history
                .iter()
                .filter(|t| t.role != Role::System)
                .cloned()
                .collect(),
        };
        Some(outbound)
    }

    pub fn apply_response(&mut self, response: ChatResponse) {
        match response.intent {
            Intent::Save => match self.last_idea.take() {
                Some(idea) => {
                    if !self.state.saved_ideas.contains(&idea) {
                        self.state.saved_ideas.push(idea);
                    }
                    self.state
                        .chat_history
                        .push(Turn::assistant(SAVE_CONFIRMATION_MESSAGE));
                }
                None => {
                    self.state
                        .chat_history
                        .push(Turn::assistant(NOTHING_TO_SAVE_MESSAGE));
                }
            },
            Intent::Generate => {
                let raw = if response.ideas.is_empty() {
                    response.content.into_iter().collect()
                } else {
                    response.ideas
                };
                // One idea must stay one card once joined into the turn.
                let ideas: Vec<String> = raw
                    .iter()
                    .map(|idea| flatten_idea(idea))
                    .filter(|idea| !idea.is_empty())
                    .collect();
                if ideas.is_empty() {
                    self.apply_failure();
                    return;
                }
                self.last_idea = ideas.last().cloned();
                self.state
                    .chat_history
                    .push(Turn::assistant(ideas.join(IDEA_SEPARATOR)));
            }
            Intent::Other => {
                let content = response
                    .content
                    .unwrap_or_else(|| APOLOGY_MESSAGE.to_string());
                self.state.chat_history.push(Turn::assistant(content));
            }
        }
        debug!(turns = self.state.chat_history.len(), "Applied gateway response");
        self.persist();
    }

    /// Record that the gateway could not be reached at all.
    pub fn apply_failure(&mut self) {
        self.state
            .chat_history
            .push(Turn::assistant(APOLOGY_MESSAGE));
        self.persist();
    }

    /// Add `idea` to the saved list, or remove it when already there.
    ///
    /// Returns whether the idea is saved afterwards.
    pub fn toggle_saved(&mut self, idea: &str) -> bool {
        if !is_saveable(idea) {
            return false;
        }
        let saved = &mut self.state.saved_ideas;
        let now_saved = match saved.iter().position(|s| s == idea) {
            Some(index) => {
                saved.remove(index);
                false
            }
            None => {
                saved.push(idea.to_string());
                true
            }
        };
        self.persist();
        now_saved
    }

    pub fn is_saved(&self, idea: &str) -> bool {
        self.state.saved_ideas.iter().any(|s| s == idea)
    }

    /// Idea cards of the newest assistant turn.
    pub fn latest_ideas(&self) -> Vec<&str> {
        self.state
            .chat_history
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| split_idea_cards(&t.content))
            .unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.last_idea = None;
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored chat state: {:#}", e);
        }
        info!("Reset chat session");
    }

    // In-memory state stays authoritative when the store cannot be written.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            warn!("Failed to persist chat state: {:#}", e);
        }
    }
}

/// Fixed assistant messages are not ideas.
pub fn is_saveable(idea: &str) -> bool {
    let idea = idea.trim();
    !idea.is_empty()
        && ![
            APOLOGY_MESSAGE,
            PLACEHOLDER_MESSAGE,
            SAVE_CONFIRMATION_MESSAGE,
            NOTHING_TO_SAVE_MESSAGE,
        ]
        .contains(&idea)
}
