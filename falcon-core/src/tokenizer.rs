//! Tokenizer wrapper around HuggingFace `tokenizers` crate.
//!
//! Handles loading `tokenizer.json`, encoding prompts into device tensors,
//! decoding token IDs back to text, and EOS detection.

use std::path::Path;

use anyhow::Result;
use candle_core::Device;
use tokenizers::Tokenizer;

use crate::backend::{TextTokenizer, TokenizedInput};

/// Wraps a HuggingFace tokenizer with convenience methods and EOS tracking.
#[derive(Clone)]
pub struct TokenizerWrapper {
    inner: Tokenizer,
    eos_token_id: Option<u32>,
}

impl TokenizerWrapper {
    /// Attempts to resolve the EOS token ID from the vocabulary.
    pub fn new(tokenizer: Tokenizer) -> Self {
        // Try common EOS token names.
        let eos_token_id = tokenizer
            .token_to_id("<|endoftext|>")
            .or_else(|| tokenizer.token_to_id("</s>"))
            .or_else(|| tokenizer.token_to_id("<|end|>"))
            .or_else(|| tokenizer.token_to_id("<|im_end|>"))
            .or_else(|| tokenizer.token_to_id("<|eot_id|>"));
        Self {
            inner: tokenizer,
            eos_token_id,
        }
    }

    /// Load a tokenizer from a local `tokenizer.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            anyhow::anyhow!("failed to load tokenizer from {}: {e}", path.display())
        })?;
        Ok(Self::new(tokenizer))
    }

    /// Override the EOS token ID (GGUF metadata usually carries it).
    pub fn set_eos_token_id(&mut self, id: u32) {
        self.eos_token_id = Some(id);
    }

    pub fn eos_token_id(&self) -> Option<u32> {
        self.eos_token_id
    }

    /// Encode text to token IDs, adding special tokens per the tokenizer's
    /// post-processor.
    pub fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenizer encode error: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl TextTokenizer for TokenizerWrapper {
    fn encode(&self, text: &str, device: &Device) -> Result<TokenizedInput> {
        let ids = self.encode_ids(text)?;
        TokenizedInput::from_ids(&ids, device)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(|e| anyhow::anyhow!("tokenizer decode error: {e}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const WORD_LEVEL_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"<unk>": 0, "hello": 1, "world": 2, "</s>": 3},
            "unk_token": "<unk>"
        }
    }"#;

    fn word_level() -> TokenizerWrapper {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL_JSON).expect("write tokenizer.json");
        TokenizerWrapper::from_file(&path).expect("load tokenizer")
    }

    #[test]
    fn finds_eos_in_vocab() {
        assert_eq!(word_level().eos_token_id(), Some(3));
    }

    #[test]
    fn eos_can_be_overridden() {
        let mut tok = word_level();
        tok.set_eos_token_id(2);
        assert_eq!(tok.eos_token_id(), Some(2));
    }

    #[test]
    fn encodes_to_batched_tensor_with_mask() {
        let tok = word_level();
        let input = TextTokenizer::encode(&tok, "hello world", &Device::Cpu).unwrap();
        assert_eq!(input.ids().unwrap(), vec![1, 2]);
        assert_eq!(input.attention_mask.dims(), &[1, 2]);
    }

    #[test]
    fn empty_text_encodes_to_empty_batch() {
        let tok = word_level();
        let input = TextTokenizer::encode(&tok, "", &Device::Cpu).unwrap();
        assert_eq!(input.seq_len().unwrap(), 0);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = TokenizerWrapper::from_file(&dir.path().join("tokenizer.json"))
            .err()
            .expect("should fail");
        assert!(format!("{err:#}").contains("failed to load tokenizer"));
    }
}
