//! Falcon Core -- a thin facade over pretrained causal language models.
//!
//! Loads a tokenizer and model by identifier (HuggingFace Hub repo or local
//! directory), optionally 8-bit quantized, and exposes single-shot `run` and
//! multi-turn `chat` on top of candle.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config;
pub mod falcon;
pub mod loader;
pub mod model;
pub mod prompt;
pub mod sampling;
pub mod session;
pub mod tokenizer;

pub use candle_core::Device;

pub use backend::{
    CausalLm, DeviceMap, GenerationParams, LoadOptions, ModelLoader, Precision, Quantization,
    TextTokenizer, TokenizedInput,
};
pub use config::GenerationConfig;
pub use falcon::Falcon;
pub use loader::HubLoader;
pub use prompt::{ConversationTurn, CuePlacement};
pub use tokenizer::TokenizerWrapper;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Select the best available compute device for the current platform.
pub fn default_device() -> Result<Device> {
    #[cfg(feature = "metal")]
    {
        tracing::info!("using Metal backend");
        return Ok(Device::new_metal(0)?);
    }

    #[cfg(feature = "cuda")]
    {
        tracing::info!("using CUDA backend");
        return Ok(Device::new_cuda(0)?);
    }

    #[allow(unreachable_code)]
    {
        tracing::info!("using CPU backend");
        Ok(Device::Cpu)
    }
}

/// Output from a `run` or `chat` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOutput {
    /// Full decoded sequence: prompt and completion, special tokens included.
    pub text: String,
    /// Only the generated part, special tokens skipped.
    pub completion: String,
    /// Full token sequence (prompt followed by generated tokens).
    pub tokens: Vec<u32>,
    pub prompt_tokens: usize,
    pub generated_tokens: usize,
}
