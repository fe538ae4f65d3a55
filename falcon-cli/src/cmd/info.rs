//! `falcon info`: print backend info and the files a model load would use.

use anyhow::Result;
use falcon_core::loader::{read_gguf_metadata, WeightFiles};
use falcon_core::{HubLoader, Quantization};

pub fn execute(model_id: Option<&str>, quantized: bool, revision: Option<&str>) -> Result<()> {
    println!("Falcon v{}", falcon_core::VERSION);
    println!();

    let device = falcon_core::default_device()?;
    println!("Device: {device:?}");

    println!("Backends:");
    #[cfg(feature = "metal")]
    println!("  - Metal (enabled)");
    #[cfg(not(feature = "metal"))]
    println!("  - Metal (disabled)");

    #[cfg(feature = "cuda")]
    println!("  - CUDA (enabled)");
    #[cfg(not(feature = "cuda"))]
    println!("  - CUDA (disabled)");

    println!("  - CPU (always available)");

    let Some(model_id) = model_id else {
        return Ok(());
    };

    let mut loader = HubLoader::new();
    if let Some(rev) = revision {
        loader = loader.with_revision(rev);
    }

    println!();
    println!("Model ID:       {model_id}");
    println!(
        "Tokenizer:      {}",
        loader.tokenizer_path(model_id)?.display()
    );

    let quantization = quantized.then_some(Quantization::Int8);
    match loader.weight_files(model_id, quantization)? {
        WeightFiles::Safetensors { config, shards } => {
            println!("Config:         {}", config.display());
            println!("Weights:        {} safetensors file(s)", shards.len());
            for shard in &shards {
                println!("  - {}", shard.display());
            }
        }
        WeightFiles::Gguf(path) => {
            let meta = read_gguf_metadata(&path)?;
            if !meta.name.is_empty() {
                println!("Name:           {}", meta.name);
            }
            println!(
                "Architecture:   {}",
                if meta.architecture.is_empty() {
                    "unknown"
                } else {
                    &meta.architecture
                }
            );
            println!("Parameters:     {}", format_params(meta.param_count));
            println!("Context length: {}", meta.context_length);
            println!("Layers:         {}", meta.block_count);
            println!("Quantization:   {}", meta.quantization);
            println!("File size:      {}", format_bytes(meta.file_size));
            println!("File:           {}", path.display());
        }
    }

    Ok(())
}

/// Format a parameter count for human display.
fn format_params(count: u64) -> String {
    if count >= 1_000_000_000 {
        format!("{:.1}B", count as f64 / 1e9)
    } else if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1e6)
    } else if count >= 1_000 {
        format!("{:.0}K", count as f64 / 1e3)
    } else {
        count.to_string()
    }
}

/// Format bytes for human display.
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GiB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MiB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.0} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
