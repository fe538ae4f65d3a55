//! The `Falcon` facade: one loaded tokenizer + model, two ways to call it.

use anyhow::{bail, Context, Result};

use crate::backend::{CausalLm, GenerationParams, LoadOptions, ModelLoader, TextTokenizer};
use crate::config::GenerationConfig;
use crate::loader::HubLoader;
use crate::prompt::{effective_system_prompt, format_chat_prompt, ConversationTurn};
use crate::GenerateOutput;

/// A tokenizer/model pair plus the generation settings used for every call.
///
/// Calls take `&mut self`; a facade is driven from one thread at a time.
pub struct Falcon {
    config: GenerationConfig,
    tokenizer: Box<dyn TextTokenizer>,
    model: Box<dyn CausalLm>,
    echo: bool,
}

impl Falcon {
    /// Load the tokenizer and model named by `config.model_id` through `loader`.
    ///
    /// The model is always requested as bf16 with automatic placement; when
    /// `config.quantized` is set, 8-bit weights are requested as well.
    pub fn new(config: GenerationConfig, loader: &dyn ModelLoader) -> Result<Self> {
        let model_id = config.model_id();
        tracing::info!(model = %model_id, quantized = config.quantized, "loading model");

        let tokenizer = loader
            .load_tokenizer(model_id)
            .with_context(|| format!("load tokenizer for {model_id:?}"))?;
        let options = LoadOptions::pretrained(config.quantized);
        let model = loader
            .load_model(model_id, &options)
            .with_context(|| format!("load model {model_id:?}"))?;

        Ok(Self {
            config,
            tokenizer,
            model,
            echo: false,
        })
    }

    /// [`Falcon::new`] with the candle / HuggingFace Hub loader.
    pub fn from_hub(config: GenerationConfig) -> Result<Self> {
        Self::new(config, &HubLoader::new())
    }

    /// Also print every decoded result to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a continuation of `prompt`.
    ///
    /// `text` holds the whole decoded sequence (prompt included, special
    /// tokens kept); `completion` holds only the new tokens.
    pub fn run(&mut self, prompt: &str) -> Result<GenerateOutput> {
        self.generate(prompt)
    }

    /// Build the transcript for `message` after `history` and generate from it.
    ///
    /// `system_prompt` overrides the configured one for this call.
    pub fn chat(
        &mut self,
        message: &str,
        history: &[ConversationTurn],
        system_prompt: Option<&str>,
    ) -> Result<GenerateOutput> {
        let prompt = self.chat_prompt(message, history, system_prompt);
        self.generate(&prompt)
    }

    /// The transcript `chat` would send for these arguments.
    pub fn chat_prompt(
        &self,
        message: &str,
        history: &[ConversationTurn],
        system_prompt: Option<&str>,
    ) -> String {
        let system = effective_system_prompt(system_prompt, self.config.system_prompt.as_deref());
        format_chat_prompt(
            message,
            history,
            system,
            &self.config.assistant_name,
            self.config.cue,
        )
    }

    fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            do_sample: true,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_new_tokens: self.config.max_new_tokens,
        }
    }

    fn generate(&mut self, prompt: &str) -> Result<GenerateOutput> {
        let input = self
            .tokenizer
            .encode(prompt, self.model.device())
            .context("tokenize prompt")?;
        let prompt_tokens = input.seq_len()?;
        tracing::debug!(prompt_tokens, "prompt tokenized");

        let params = self.generation_params();
        let sequences = self.model.generate(&input, &params).context("generate")?;
        let Some(tokens) = sequences.into_iter().next() else {
            bail!("model returned no sequences");
        };

        let text = self
            .tokenizer
            .decode(&tokens, false)
            .context("decode output")?;
        let new_tokens = tokens.get(prompt_tokens..).unwrap_or_default();
        let completion = self
            .tokenizer
            .decode(new_tokens, true)
            .context("decode completion")?;

        if self.echo {
            println!("{text}");
        }

        Ok(GenerateOutput {
            text,
            completion,
            prompt_tokens,
            generated_tokens: new_tokens.len(),
            tokens,
        })
    }
}
