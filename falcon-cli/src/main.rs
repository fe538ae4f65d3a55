//! Falcon CLI: run prompts and chat with a pretrained model from the command line.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use falcon_core::{CuePlacement, GenerationConfig, HubLoader};
use tracing_subscriber::EnvFilter;

mod cmd {
    pub mod chat;
    pub mod info;
    pub mod run;
}

#[derive(Parser, Debug)]
#[command(
    name = "falcon",
    about = "Falcon - run and chat with pretrained causal language models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a continuation for a single prompt.
    Run {
        #[command(flatten)]
        model: ModelArgs,

        /// Prompt text.
        #[arg(short, long)]
        prompt: String,

        /// Print only the generated text instead of the full sequence.
        #[arg(long, default_value_t = false)]
        completion_only: bool,
    },
    /// Interactive multi-turn chat. Type `exit` or `quit` to stop.
    Chat {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Show available backends and, with --model, the files a load would use.
    Info {
        /// Model ID (HuggingFace repo or local directory).
        #[arg(short, long)]
        model: Option<String>,

        /// Inspect the 8-bit GGUF weights instead of safetensors.
        #[arg(long, default_value_t = false)]
        quantized: bool,

        /// HuggingFace revision/branch.
        #[arg(long)]
        revision: Option<String>,
    },
}

/// Options shared by the commands that load a model.
#[derive(Args, Debug)]
struct ModelArgs {
    /// Model ID (HuggingFace repo or local directory).
    #[arg(short, long)]
    model: Option<String>,

    /// JSON file with generation settings; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling temperature.
    #[arg(long, allow_negative_numbers = true)]
    temperature: Option<f64>,

    /// Nucleus sampling threshold.
    #[arg(long)]
    top_p: Option<f64>,

    /// Maximum tokens to generate.
    #[arg(long)]
    max_new_tokens: Option<usize>,

    /// Load 8-bit quantized weights.
    #[arg(long, default_value_t = false)]
    quantized: bool,

    /// Default system prompt for chat.
    #[arg(long)]
    system_prompt: Option<String>,

    /// Label for the model side of chat transcripts.
    #[arg(long)]
    assistant_name: Option<String>,

    /// Repeat the user cue after every history turn (legacy transcript layout).
    #[arg(long, default_value_t = false)]
    legacy_cue: bool,

    /// HuggingFace revision/branch.
    #[arg(long)]
    revision: Option<String>,

    /// Exact GGUF file name for quantized loads.
    #[arg(long)]
    gguf_file: Option<String>,

    /// Sampling seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Force CPU even when an accelerator backend is compiled in.
    #[arg(long, default_value_t = false)]
    cpu: bool,
}

impl ModelArgs {
    fn generation_config(&self) -> Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => GenerationConfig::from_json_file(path)?,
            None => GenerationConfig::default(),
        };
        if let Some(model) = &self.model {
            config = config.with_model_id(model.clone());
        }
        if let Some(t) = self.temperature {
            config = config.with_temperature(t);
        }
        if let Some(p) = self.top_p {
            config = config.with_top_p(p);
        }
        if let Some(n) = self.max_new_tokens {
            config = config.with_max_new_tokens(n);
        }
        if self.quantized {
            config = config.with_quantized(true);
        }
        if let Some(system) = &self.system_prompt {
            config = config.with_system_prompt(system.clone());
        }
        if let Some(name) = &self.assistant_name {
            config = config.with_assistant_name(name.clone());
        }
        if self.legacy_cue {
            config = config.with_cue(CuePlacement::PerHistoryTurn);
        }
        Ok(config)
    }

    fn loader(&self) -> HubLoader {
        let mut loader = HubLoader::new();
        if let Some(rev) = &self.revision {
            loader = loader.with_revision(rev.clone());
        }
        if let Some(name) = &self.gguf_file {
            loader = loader.with_gguf_file(name.clone());
        }
        if let Some(seed) = self.seed {
            loader = loader.with_seed(seed);
        }
        if self.cpu {
            loader = loader.with_device(falcon_core::Device::Cpu);
        }
        loader
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            prompt,
            completion_only,
        } => cmd::run::execute(
            model.generation_config()?,
            &model.loader(),
            &prompt,
            completion_only,
        ),
        Commands::Chat { model } => {
            cmd::chat::execute(model.generation_config()?, &model.loader())
        }
        Commands::Info {
            model,
            quantized,
            revision,
        } => cmd::info::execute(model.as_deref(), quantized, revision.as_deref()),
    }
}
