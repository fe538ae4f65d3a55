#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use candle_core::Device;
use falcon_core::{
    CausalLm, GenerationParams, LoadOptions, ModelLoader, TextTokenizer, TokenizedInput,
};

/// Rendered for [`EOS`] when special tokens are kept.
pub const EOS_TEXT: &str = "<|endoftext|>";
pub const EOS: u32 = 256;

/// Everything the stub capability was asked to do.
#[derive(Debug, Default)]
pub struct CallLog {
    pub tokenizer_loads: Vec<String>,
    pub model_loads: Vec<(String, LoadOptions)>,
    pub generate_calls: Vec<(Vec<u32>, GenerationParams)>,
}

impl CallLog {
    /// Prompts passed to `generate`, decoded back to text.
    pub fn prompts(&self) -> Vec<String> {
        self.generate_calls
            .iter()
            .map(|(ids, _)| bytes_to_text(ids, true))
            .collect()
    }
}

/// Loader whose tokenizer maps bytes to IDs and whose model always answers
/// `reply` followed by EOS.
#[derive(Clone)]
pub struct StubLoader {
    pub log: Arc<Mutex<CallLog>>,
    pub reply: String,
    pub fail_model_load: bool,
    pub empty_output: bool,
}

impl StubLoader {
    pub fn new(reply: &str) -> Self {
        Self {
            log: Arc::new(Mutex::new(CallLog::default())),
            reply: reply.to_string(),
            fail_model_load: false,
            empty_output: false,
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.log.lock().expect("call log poisoned")
    }
}

impl ModelLoader for StubLoader {
    fn load_tokenizer(&self, model_id: &str) -> Result<Box<dyn TextTokenizer>> {
        self.log().tokenizer_loads.push(model_id.to_string());
        Ok(Box::new(ByteTokenizer))
    }

    fn load_model(&self, model_id: &str, options: &LoadOptions) -> Result<Box<dyn CausalLm>> {
        if self.fail_model_load {
            bail!("no such repo: {model_id}");
        }
        self.log()
            .model_loads
            .push((model_id.to_string(), options.clone()));
        Ok(Box::new(StubModel {
            log: Arc::clone(&self.log),
            reply: self.reply.clone(),
            empty_output: self.empty_output,
            device: Device::Cpu,
        }))
    }
}

pub struct ByteTokenizer;

impl TextTokenizer for ByteTokenizer {
    fn encode(&self, text: &str, device: &Device) -> Result<TokenizedInput> {
        let ids: Vec<u32> = text.bytes().map(u32::from).collect();
        TokenizedInput::from_ids(&ids, device)
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        Ok(bytes_to_text(ids, skip_special_tokens))
    }
}

pub fn bytes_to_text(ids: &[u32], skip_special_tokens: bool) -> String {
    let mut out = String::new();
    let mut bytes = Vec::new();
    for &id in ids {
        if id == EOS {
            out.push_str(&String::from_utf8_lossy(&bytes));
            bytes.clear();
            if !skip_special_tokens {
                out.push_str(EOS_TEXT);
            }
        } else {
            bytes.push(id as u8);
        }
    }
    out.push_str(&String::from_utf8_lossy(&bytes));
    out
}

struct StubModel {
    log: Arc<Mutex<CallLog>>,
    reply: String,
    empty_output: bool,
    device: Device,
}

impl CausalLm for StubModel {
    fn device(&self) -> &Device {
        &self.device
    }

    fn generate(
        &mut self,
        input: &TokenizedInput,
        params: &GenerationParams,
    ) -> Result<Vec<Vec<u32>>> {
        let ids = input.ids()?;
        self.log
            .lock()
            .expect("call log poisoned")
            .generate_calls
            .push((ids.clone(), params.clone()));
        if self.empty_output {
            return Ok(Vec::new());
        }
        let mut sequence = ids;
        sequence.extend(self.reply.bytes().map(u32::from));
        sequence.push(EOS);
        Ok(vec![sequence])
    }
}

/// Local model directory for tests that need real weights.
pub fn maybe_model_dir() -> Option<PathBuf> {
    std::env::var_os("FALCON_MODEL_DIR").map(PathBuf::from)
}
