//! Generation configuration held by a [`Falcon`](crate::Falcon) facade.
//!
//! Values are stored as given. Nothing here checks ranges: a negative
//! temperature or a top-p above one is handed to the backend unchanged and
//! the backend decides what to do with it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prompt::CuePlacement;

/// Label used for the model side of a chat transcript.
pub const DEFAULT_ASSISTANT_NAME: &str = "Falcon";

/// Sampling and loading parameters, fixed for the lifetime of a facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// HuggingFace repo ID (e.g. "tiiuae/falcon-7b-instruct") or a local
    /// model directory.
    pub model_id: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_new_tokens: Option<usize>,
    /// Request 8-bit weights from the loader.
    pub quantized: bool,
    /// Default system prompt for `chat` when the call does not supply one.
    pub system_prompt: Option<String>,
    /// Stands in for `<Model>` in chat transcripts.
    pub assistant_name: String,
    pub cue: CuePlacement,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: None,
            temperature: None,
            top_p: None,
            max_new_tokens: None,
            quantized: false,
            system_prompt: None,
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            cue: CuePlacement::default(),
        }
    }
}

impl GenerationConfig {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: Some(model_id.into()),
            ..Default::default()
        }
    }

    /// Read a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = Some(max_new_tokens);
        self
    }

    pub fn with_quantized(mut self, quantized: bool) -> Self {
        self.quantized = quantized;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    pub fn with_cue(mut self, cue: CuePlacement) -> Self {
        self.cue = cue;
        self
    }

    /// The model identifier, or the empty string when none was configured.
    /// An empty identifier is left for the loader to reject.
    pub fn model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or_default()
    }
}
