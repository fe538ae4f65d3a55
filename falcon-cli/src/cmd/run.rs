//! `falcon run`: generate a continuation for one prompt.

use std::time::Instant;

use anyhow::Result;
use falcon_core::{Falcon, GenerationConfig, ModelLoader};

pub fn execute(
    config: GenerationConfig,
    loader: &dyn ModelLoader,
    prompt: &str,
    completion_only: bool,
) -> Result<()> {
    let t_load = Instant::now();
    let mut falcon = Falcon::new(config, loader)?;
    let load_elapsed = t_load.elapsed();

    let t_start = Instant::now();
    let out = falcon.run(prompt)?;
    let elapsed = t_start.elapsed();

    if completion_only {
        println!("{}", out.completion);
    } else {
        println!("{}", out.text);
    }

    let tokens_per_sec = if elapsed.as_secs_f64() > 0.0 {
        out.generated_tokens as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("--- generation stats ---");
    eprintln!("Prompt tokens:    {}", out.prompt_tokens);
    eprintln!("Generated tokens: {}", out.generated_tokens);
    eprintln!("Load time:        {:.2}s", load_elapsed.as_secs_f64());
    eprintln!("Decode speed:     {tokens_per_sec:.1} tok/s");
    eprintln!("Total time:       {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
