//! The forward-pass `Model` trait and its candle implementations.
//!
//! Full-precision safetensors are dispatched on the `config.json`
//! architecture: Llama via `candle_transformers::models::llama`, Falcon via
//! `candle_transformers::models::falcon`. 8-bit GGUF goes through
//! `candle_transformers::models::quantized_llama`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use candle_core::quantized::gguf_file;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::falcon;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig};
use candle_transformers::models::quantized_llama::ModelWeights;
use serde::Deserialize;

use crate::backend::{CausalLm, GenerationParams, TokenizedInput};
use crate::session::InferenceSession;

// ---------------------------------------------------------------------------
// Model trait
// ---------------------------------------------------------------------------

/// Core trait for a loadable, runnable language model.
pub trait Model: Send {
    /// Forward pass: given input token IDs `(batch=1, seq_len)` and a
    /// starting position, return logits for the last position `(1, vocab_size)`.
    fn forward(&mut self, input_ids: &Tensor, position: usize) -> Result<Tensor>;

    /// Drop any KV-cache state so the next forward starts a new sequence.
    fn reset(&mut self) -> Result<()>;

    /// Device this model lives on.
    fn device(&self) -> &Device;

    /// Maximum context length the model supports.
    fn max_seq_len(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Architecture detection
// ---------------------------------------------------------------------------

/// Model family a safetensors checkpoint is loaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Llama,
    Falcon,
}

impl Architecture {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "llama" | "LlamaForCausalLM" => Some(Self::Llama),
            "falcon" | "RefinedWeb" | "RefinedWebModel" | "FalconForCausalLM"
            | "RWForCausalLM" => Some(Self::Falcon),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigHeader {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    architectures: Vec<String>,
    #[serde(default)]
    eos_token_id: Option<serde_json::Value>,
}

/// What a `config.json` says about a checkpoint before its weights are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSummary {
    pub architecture: Architecture,
    /// First EOS id listed, when the config has one.
    pub eos_token_id: Option<u32>,
}

impl ConfigSummary {
    pub fn from_json(config_json: &[u8]) -> Result<Self> {
        let header: ConfigHeader =
            serde_json::from_slice(config_json).context("parse model config")?;
        let architecture = header
            .model_type
            .iter()
            .chain(header.architectures.iter())
            .find_map(|name| Architecture::from_name(name));

        let Some(architecture) = architecture else {
            let named = header
                .model_type
                .as_deref()
                .or(header.architectures.first().map(String::as_str));
            match named {
                Some(name) => bail!("unsupported architecture {name}"),
                None => bail!("model config names no architecture (model_type / architectures)"),
            }
        };
        let eos_token_id = header.eos_token_id.as_ref().and_then(first_token_id);
        Ok(Self {
            architecture,
            eos_token_id,
        })
    }
}

fn first_token_id(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|id| u32::try_from(id).ok()),
        serde_json::Value::Array(ids) => ids.iter().find_map(first_token_id),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Safetensors Llama
// ---------------------------------------------------------------------------

/// A Llama-family model loaded from (possibly sharded) safetensors.
pub struct SafetensorsLlama {
    model: Llama,
    config: Config,
    cache: Cache,
    dtype: DType,
    device: Device,
}

impl SafetensorsLlama {
    pub fn load(
        config_json: &[u8],
        weight_paths: &[PathBuf],
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        let config: LlamaConfig =
            serde_json::from_slice(config_json).context("parse llama config")?;
        let config = config.into_config(false);

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(weight_paths, dtype, device) }
            .context("failed to mmap safetensors weights")?;
        let model = Llama::load(vb, &config).context("failed to build llama from weights")?;
        let cache =
            Cache::new(true, dtype, &config, device).context("failed to allocate kv cache")?;

        Ok(Self {
            model,
            config,
            cache,
            dtype,
            device: device.clone(),
        })
    }
}

impl Model for SafetensorsLlama {
    fn forward(&mut self, input_ids: &Tensor, position: usize) -> Result<Tensor> {
        let logits = self
            .model
            .forward(input_ids, position, &mut self.cache)
            .context("llama forward pass")?;
        Ok(logits)
    }

    fn reset(&mut self) -> Result<()> {
        self.cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn max_seq_len(&self) -> usize {
        self.config.max_position_embeddings
    }
}

// ---------------------------------------------------------------------------
// Safetensors Falcon
// ---------------------------------------------------------------------------

/// Falcon-7B/1B were trained with a 2048-token window; the config does not record it.
const FALCON_CONTEXT_LENGTH: usize = 2048;

/// Falcon `config.json`, accepting the older `RefinedWebModel` key names.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct FalconConfigFile {
    vocab_size: usize,
    #[serde(alias = "n_embed")]
    hidden_size: usize,
    #[serde(alias = "n_layer")]
    num_hidden_layers: usize,
    #[serde(alias = "n_head")]
    num_attention_heads: usize,
    layer_norm_epsilon: f64,
    bos_token_id: u32,
    eos_token_id: u32,
    #[serde(alias = "num_kv_heads")]
    n_head_kv: Option<usize>,
    alibi: bool,
    new_decoder_architecture: bool,
    multi_query: bool,
    parallel_attn: bool,
    bias: bool,
}

impl Default for FalconConfigFile {
    fn default() -> Self {
        let c = falcon::Config::default();
        Self {
            vocab_size: c.vocab_size,
            hidden_size: c.hidden_size,
            num_hidden_layers: c.num_hidden_layers,
            num_attention_heads: c.num_attention_heads,
            layer_norm_epsilon: c.layer_norm_epsilon,
            bos_token_id: c.bos_token_id,
            eos_token_id: c.eos_token_id,
            n_head_kv: c.n_head_kv,
            alibi: c.alibi,
            new_decoder_architecture: c.new_decoder_architecture,
            multi_query: c.multi_query,
            parallel_attn: c.parallel_attn,
            bias: c.bias,
        }
    }
}

impl FalconConfigFile {
    fn into_config(self) -> falcon::Config {
        falcon::Config {
            vocab_size: self.vocab_size,
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            layer_norm_epsilon: self.layer_norm_epsilon,
            bos_token_id: self.bos_token_id,
            eos_token_id: self.eos_token_id,
            n_head_kv: self.n_head_kv,
            alibi: self.alibi,
            new_decoder_architecture: self.new_decoder_architecture,
            multi_query: self.multi_query,
            parallel_attn: self.parallel_attn,
            bias: self.bias,
            ..falcon::Config::default()
        }
    }
}

fn parse_falcon_config(config_json: &[u8]) -> Result<falcon::Config> {
    let file: FalconConfigFile =
        serde_json::from_slice(config_json).context("parse falcon config")?;
    let config = file.into_config();
    config.validate().context("unsupported falcon variant")?;
    Ok(config)
}

/// A Falcon model loaded from (possibly sharded) safetensors.
pub struct SafetensorsFalcon {
    model: falcon::Falcon,
    device: Device,
}

impl SafetensorsFalcon {
    pub fn load(
        config_json: &[u8],
        weight_paths: &[PathBuf],
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        let config = parse_falcon_config(config_json)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(weight_paths, dtype, device) }
            .context("failed to mmap safetensors weights")?;
        let model =
            falcon::Falcon::load(vb, config).context("failed to build falcon from weights")?;
        Ok(Self {
            model,
            device: device.clone(),
        })
    }
}

impl Model for SafetensorsFalcon {
    /// `position` is implied by the KV cache length.
    fn forward(&mut self, input_ids: &Tensor, _position: usize) -> Result<Tensor> {
        let logits = self
            .model
            .forward(input_ids)
            .context("falcon forward pass")?;
        Ok(logits)
    }

    fn reset(&mut self) -> Result<()> {
        self.model.clear_kv_cache();
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn max_seq_len(&self) -> usize {
        FALCON_CONTEXT_LENGTH
    }
}

// ---------------------------------------------------------------------------
// Quantized Llama
// ---------------------------------------------------------------------------

/// A GGUF-quantized Llama-family model.
pub struct QuantizedLlama {
    weights: ModelWeights,
    device: Device,
    max_seq_len: usize,
}

impl QuantizedLlama {
    /// Load GGUF weights. Returns the model and the EOS token ID recorded in
    /// the file's metadata, if any.
    pub fn load(path: &Path, device: &Device) -> Result<(Self, Option<u32>)> {
        let mut file =
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| anyhow::anyhow!("failed to read GGUF content: {e}"))?;

        let arch = metadata_str(&content, "general.architecture").unwrap_or("llama");
        let max_seq_len = metadata_u32(&content, &format!("{arch}.context_length"))
            .map(|v| v as usize)
            .unwrap_or(4096);
        let eos_token_id = ["tokenizer.ggml.eos_token_id", "general.eos_token_id"]
            .iter()
            .find_map(|key| metadata_u32(&content, key));

        let weights = ModelWeights::from_gguf(content, &mut file, device)
            .context("failed to load quantized llama weights from GGUF")?;
        tracing::info!(max_seq_len, "quantized model loaded");

        Ok((
            Self {
                weights,
                device: device.clone(),
                max_seq_len,
            },
            eos_token_id,
        ))
    }
}

impl Model for QuantizedLlama {
    fn forward(&mut self, input_ids: &Tensor, position: usize) -> Result<Tensor> {
        let logits = self
            .weights
            .forward(input_ids, position)
            .context("quantized llama forward pass")?;
        Ok(logits)
    }

    fn reset(&mut self) -> Result<()> {
        // Each layer's cache is overwritten when a forward starts at position 0.
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }
}

pub(crate) fn metadata_str<'a>(content: &'a gguf_file::Content, key: &str) -> Option<&'a str> {
    content
        .metadata
        .get(key)
        .and_then(|v| v.to_string().ok())
        .map(String::as_str)
}

pub(crate) fn metadata_u32(content: &gguf_file::Content, key: &str) -> Option<u32> {
    content.metadata.get(key).and_then(|v| v.to_u32().ok())
}

// ---------------------------------------------------------------------------
// CausalLm adapter
// ---------------------------------------------------------------------------

/// Binds a [`Model`] to the decoding loop, exposing it as a [`CausalLm`].
pub struct CandleCausalLm {
    model: Box<dyn Model>,
    eos_token_id: Option<u32>,
    seed: u64,
}

impl CandleCausalLm {
    pub fn new(model: Box<dyn Model>, eos_token_id: Option<u32>, seed: u64) -> Self {
        Self {
            model,
            eos_token_id,
            seed,
        }
    }
}

impl CausalLm for CandleCausalLm {
    fn device(&self) -> &Device {
        self.model.device()
    }

    fn generate(
        &mut self,
        input: &TokenizedInput,
        params: &GenerationParams,
    ) -> Result<Vec<Vec<u32>>> {
        let prompt_tokens = input.ids()?;
        let seed = self.seed;
        self.seed = self.seed.wrapping_add(1);

        let mut session =
            InferenceSession::new(self.model.as_mut(), self.eos_token_id, params, seed);
        let generated = session.generate(&prompt_tokens)?;

        let mut sequence = prompt_tokens;
        sequence.extend_from_slice(&generated);
        Ok(vec![sequence])
    }
}
