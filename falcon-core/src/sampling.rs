//! Token sampling: maps [`GenerationParams`] onto candle's `LogitsProcessor`.

use candle_transformers::generation::{LogitsProcessor, Sampling};

use crate::backend::GenerationParams;

/// Temperature used when sampling is requested without one.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
/// Top-k cut applied when sampling, as the hub's generation defaults do.
pub const DEFAULT_TOP_K: usize = 50;
/// Token budget when `max_new_tokens` is not set.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 20;

/// Pick the sampling strategy for a generate call.
///
/// Greedy when sampling is off or the temperature is ~0 (this also swallows
/// negative temperatures). Otherwise top-k, then top-p when `top_p < 1`.
pub fn sampling_strategy(params: &GenerationParams) -> Sampling {
    let temperature = params.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !params.do_sample || temperature < 1e-7 {
        return Sampling::ArgMax;
    }

    match params.top_p {
        Some(p) if p < 1.0 => Sampling::TopKThenTopP {
            k: DEFAULT_TOP_K,
            p,
            temperature,
        },
        _ => Sampling::TopK {
            k: DEFAULT_TOP_K,
            temperature,
        },
    }
}

pub fn logits_processor(params: &GenerationParams, seed: u64) -> LogitsProcessor {
    LogitsProcessor::from_sampling(seed, sampling_strategy(params))
}

pub fn max_new_tokens(params: &GenerationParams) -> usize {
    params.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS)
}
