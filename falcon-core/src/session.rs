//! Inference session: drives token-by-token autoregressive generation.

use anyhow::{bail, Context, Result};
use candle_core::{DType, Tensor};
use candle_transformers::generation::LogitsProcessor;

use crate::backend::GenerationParams;
use crate::model::Model;
use crate::sampling;

/// Drives prefill + decode over a [`Model`] for one generate call.
pub struct InferenceSession<'a> {
    model: &'a mut dyn Model,
    eos_token_id: Option<u32>,
    processor: LogitsProcessor,
    max_new_tokens: usize,
}

impl<'a> InferenceSession<'a> {
    pub fn new(
        model: &'a mut dyn Model,
        eos_token_id: Option<u32>,
        params: &GenerationParams,
        seed: u64,
    ) -> Self {
        Self {
            model,
            eos_token_id,
            processor: sampling::logits_processor(params, seed),
            max_new_tokens: sampling::max_new_tokens(params),
        }
    }

    /// Generate up to `max_new_tokens` after `prompt_tokens`.
    ///
    /// Returns only the new tokens. An EOS token ends generation and is kept
    /// as the last element.
    pub fn generate(&mut self, prompt_tokens: &[u32]) -> Result<Vec<u32>> {
        if prompt_tokens.is_empty() {
            bail!("prompt produced no tokens");
        }
        let mut generated = Vec::with_capacity(self.max_new_tokens);
        if self.max_new_tokens == 0 {
            return Ok(generated);
        }

        let max_seq_len = self.model.max_seq_len();
        if prompt_tokens.len() >= max_seq_len {
            bail!(
                "prompt is {} tokens, model context is {max_seq_len}",
                prompt_tokens.len()
            );
        }

        self.model.reset().context("reset kv cache")?;
        let device = self.model.device().clone();

        // Prefill: full prompt in one forward pass.
        let input = Tensor::new(prompt_tokens, &device)?.unsqueeze(0)?;
        let logits = self.model.forward(&input, 0)?;
        let mut next_token = self.sample(&logits)?;
        generated.push(next_token);

        // Decode loop: one token at a time.
        let mut pos = prompt_tokens.len();
        while !self.is_eos(next_token) && generated.len() < self.max_new_tokens {
            if pos >= max_seq_len {
                tracing::warn!(pos, max = max_seq_len, "reached max sequence length");
                break;
            }
            let input = Tensor::new(&[next_token], &device)?.unsqueeze(0)?;
            let logits = self
                .model
                .forward(&input, pos)
                .with_context(|| format!("forward at pos {pos}"))?;
            next_token = self.sample(&logits)?;
            generated.push(next_token);
            pos += 1;
        }

        tracing::debug!(
            prompt_tokens = prompt_tokens.len(),
            generated_tokens = generated.len(),
            "generation finished"
        );
        Ok(generated)
    }

    fn sample(&mut self, logits: &Tensor) -> Result<u32> {
        let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
        self.processor.sample(&logits).context("sample next token")
    }

    fn is_eos(&self, token: u32) -> bool {
        self.eos_token_id == Some(token)
    }
}
