//! The model-loading capability the facade is written against.
//!
//! Loading, precision, device placement, quantization and the sampling loop
//! all live behind these traits. [`HubLoader`](crate::loader::HubLoader) is
//! the candle implementation; tests plug in recording stubs.

use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};

/// Numeric precision requested for model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Bf16,
    F16,
    F32,
}

impl Precision {
    pub fn dtype(self) -> DType {
        match self {
            Self::Bf16 => DType::BF16,
            Self::F16 => DType::F16,
            Self::F32 => DType::F32,
        }
    }
}

/// Where the model should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceMap {
    /// Best available accelerator, falling back to CPU.
    Auto,
    Cpu,
}

/// Reduced-precision weight formats a loader may be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantization {
    Int8,
}

/// Options passed to [`ModelLoader::load_model`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub precision: Precision,
    pub device_map: DeviceMap,
    pub quantization: Option<Quantization>,
}

impl LoadOptions {
    /// bf16 weights with automatic placement, optionally 8-bit quantized.
    pub fn pretrained(quantized: bool) -> Self {
        Self {
            precision: Precision::Bf16,
            device_map: DeviceMap::Auto,
            quantization: quantized.then_some(Quantization::Int8),
        }
    }
}

/// Sampling parameters for one `generate` call. `None` means "use the
/// backend's default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub do_sample: bool,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_new_tokens: Option<usize>,
}

/// A tokenized prompt, resident on the model's device.
#[derive(Debug, Clone)]
pub struct TokenizedInput {
    /// `(1, seq_len)` u32 token IDs.
    pub input_ids: Tensor,
    /// `(1, seq_len)` u32, 1 for real tokens.
    pub attention_mask: Tensor,
}

impl TokenizedInput {
    /// Build a single-sequence batch with an all-ones mask.
    pub fn from_ids(ids: &[u32], device: &Device) -> Result<Self> {
        let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
        let attention_mask = Tensor::ones((1, ids.len()), DType::U32, device)?;
        Ok(Self {
            input_ids,
            attention_mask,
        })
    }

    pub fn seq_len(&self) -> Result<usize> {
        Ok(self.input_ids.dim(1)?)
    }

    /// Token IDs of the first (only) sequence.
    pub fn ids(&self) -> Result<Vec<u32>> {
        let rows: Vec<Vec<u32>> = self.input_ids.to_vec2()?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }
}

/// Text <-> token conversion.
pub trait TextTokenizer: Send {
    /// Encode `text` (special tokens added per the tokenizer's config).
    fn encode(&self, text: &str, device: &Device) -> Result<TokenizedInput>;

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String>;
}

/// An autoregressive model with its own decoding loop.
pub trait CausalLm: Send {
    /// Device inputs must live on.
    fn device(&self) -> &Device;

    /// Generate continuations. Each returned sequence is the prompt followed
    /// by the generated tokens.
    fn generate(
        &mut self,
        input: &TokenizedInput,
        params: &GenerationParams,
    ) -> Result<Vec<Vec<u32>>>;
}

/// Resolves a model identifier to a tokenizer and a model.
pub trait ModelLoader {
    fn load_tokenizer(&self, model_id: &str) -> Result<Box<dyn TextTokenizer>>;

    fn load_model(&self, model_id: &str, options: &LoadOptions) -> Result<Box<dyn CausalLm>>;
}
