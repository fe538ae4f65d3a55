//! Flat-text chat transcript formatting.
//!
//! A transcript looks like:
//!
//! ```text
//! System: <system prompt>
//! User: <message>
//! Falcon: <response>
//! User: <new message>
//! Falcon:
//! ```

use serde::{Deserialize, Serialize};

/// One prior exchange in a conversation. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub response: String,
}

impl ConversationTurn {
    pub fn new(user: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            response: response.into(),
        }
    }
}

impl<U: Into<String>, R: Into<String>> From<(U, R)> for ConversationTurn {
    fn from((user, response): (U, R)) -> Self {
        Self::new(user, response)
    }
}

/// Where the trailing `User: <message>\n<Model>:` cue goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuePlacement {
    /// Once, after the whole history.
    #[default]
    Once,
    /// After every history turn, and not at all for an empty history.
    /// Legacy layout, kept so old transcripts can be reproduced.
    PerHistoryTurn,
}

/// Pick the system prompt for a chat call: the call's own value when it is
/// present and non-empty, else the configured default. An empty result
/// means no `System:` line.
pub fn effective_system_prompt<'a>(
    call: Option<&'a str>,
    default: Option<&'a str>,
) -> Option<&'a str> {
    call.filter(|s| !s.is_empty())
        .or(default)
        .filter(|s| !s.is_empty())
}

/// Build the flat transcript sent to the model for one chat call.
pub fn format_chat_prompt(
    message: &str,
    history: &[ConversationTurn],
    system_prompt: Option<&str>,
    assistant_name: &str,
    cue: CuePlacement,
) -> String {
    let mut prompt = String::new();
    if let Some(system) = system_prompt {
        prompt.push_str(&format!("System: {system}\n"));
    }

    let cue_text = format!("User: {message}\n{assistant_name}:");
    for turn in history {
        prompt.push_str(&format!("User: {}\n", turn.user));
        prompt.push_str(&format!("{assistant_name}: {}\n", turn.response));
        if cue == CuePlacement::PerHistoryTurn {
            prompt.push_str(&cue_text);
        }
    }
    if cue == CuePlacement::Once {
        prompt.push_str(&cue_text);
    }
    prompt
}
