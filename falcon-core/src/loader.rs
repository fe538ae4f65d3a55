//! Model loader: resolves an identifier against a local directory or the
//! HuggingFace Hub, then builds the tokenizer and model.
//!
//! Supports two weight layouts:
//! 1. `config.json` + safetensors (single file or sharded) -> full precision
//!    Llama or Falcon, picked from the config's architecture
//! 2. a `*q8_0*.gguf` file                                 -> 8-bit quantized

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use candle_core::quantized::gguf_file;
use candle_core::{DType, Device};
use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use crate::backend::{
    CausalLm, DeviceMap, LoadOptions, ModelLoader, Precision, Quantization, TextTokenizer,
};
use crate::model::{
    metadata_str, metadata_u32, Architecture, CandleCausalLm, ConfigSummary, Model,
    QuantizedLlama, SafetensorsFalcon, SafetensorsLlama,
};
use crate::tokenizer::TokenizerWrapper;

const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const SAFETENSORS_INDEX_FILE: &str = "model.safetensors.index.json";

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where model files come from.
pub enum ModelSource {
    Local(PathBuf),
    Hub { model_id: String, repo: ApiRepo },
}

impl ModelSource {
    /// Local directory if `model_id` names one, otherwise a Hub repo.
    pub fn open(model_id: &str, revision: Option<&str>) -> Result<Self> {
        if model_id.trim().is_empty() {
            bail!("no model identifier given");
        }

        let local = Path::new(model_id);
        if local.is_dir() {
            tracing::info!(path = %local.display(), "using local model directory");
            return Ok(Self::Local(local.to_path_buf()));
        }

        let api = Api::new().context("failed to initialize HuggingFace Hub API")?;
        let repo = match revision {
            Some(rev) => api.repo(Repo::with_revision(
                model_id.to_string(),
                RepoType::Model,
                rev.to_string(),
            )),
            None => api.model(model_id.to_string()),
        };
        Ok(Self::Hub {
            model_id: model_id.to_string(),
            repo,
        })
    }

    /// Repo id or directory, for messages.
    pub fn name(&self) -> String {
        match self {
            Self::Local(dir) => dir.display().to_string(),
            Self::Hub { model_id, .. } => model_id.clone(),
        }
    }

    /// Local path of `filename`, downloading it if needed.
    pub fn get(&self, filename: &str) -> Result<PathBuf> {
        match self {
            Self::Local(dir) => {
                let path = dir.join(filename);
                if !path.exists() {
                    bail!("{filename} not found in {}", dir.display());
                }
                Ok(path)
            }
            Self::Hub { model_id, repo } => {
                let pb = spinner(format!("Fetching {filename} from {model_id}..."));
                with_spinner(&pb, || repo.get(filename))
                    .with_context(|| format!("failed to download {filename} from {model_id}"))
            }
        }
    }

    /// File names available in the source.
    pub fn list_files(&self) -> Result<Vec<String>> {
        match self {
            Self::Local(dir) => {
                let mut names = Vec::new();
                for entry in std::fs::read_dir(dir)
                    .with_context(|| format!("read_dir {}", dir.display()))?
                {
                    let entry = entry?;
                    if entry.file_type()?.is_file() {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                names.sort();
                Ok(names)
            }
            Self::Hub { model_id, repo } => {
                let info = repo
                    .info()
                    .with_context(|| format!("failed to list files of {model_id}"))?;
                Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run `f` while `pb` spins; the bar is cleared whether `f` succeeds or not.
fn with_spinner<T, E>(pb: &ProgressBar, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let result = f();
    pb.finish_and_clear();
    result
}

// ---------------------------------------------------------------------------
// File resolution
// ---------------------------------------------------------------------------

/// Weight files for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightFiles {
    Safetensors { config: PathBuf, shards: Vec<PathBuf> },
    Gguf(PathBuf),
}

#[derive(Debug, Deserialize)]
struct SafetensorsIndex {
    weight_map: std::collections::HashMap<String, String>,
}

/// Distinct shard file names listed in a `model.safetensors.index.json`.
pub fn shard_names(index_json: &[u8]) -> Result<Vec<String>> {
    let index: SafetensorsIndex =
        serde_json::from_slice(index_json).context("parse safetensors index")?;
    let names: BTreeSet<String> = index.weight_map.into_values().collect();
    if names.is_empty() {
        bail!("safetensors index lists no weight files");
    }
    Ok(names.into_iter().collect())
}

/// Pick the 8-bit GGUF file: the override when given, else the first file
/// whose name contains `q8_0` (any case). `source` names the repo or
/// directory in the error.
pub fn pick_q8_gguf(source: &str, files: &[String], preferred: Option<&str>) -> Result<String> {
    if let Some(name) = preferred {
        return Ok(name.to_string());
    }
    let mut candidates: Vec<&String> = files
        .iter()
        .filter(|f| {
            let lower = f.to_ascii_lowercase();
            lower.ends_with(".gguf") && lower.contains("q8_0")
        })
        .collect();
    candidates.sort();
    match candidates.first() {
        Some(name) => Ok((*name).clone()),
        None => bail!(
            "no 8-bit (q8_0) .gguf file found in {source}; name one with --gguf-file \
             (HubLoader::with_gguf_file), point the model id at a GGUF mirror of this repo, \
             or load unquantized"
        ),
    }
}

fn resolve_gguf(source: &ModelSource, gguf_file: Option<&str>) -> Result<PathBuf> {
    let files = if gguf_file.is_some() {
        Vec::new()
    } else {
        source.list_files()?
    };
    let name = pick_q8_gguf(&source.name(), &files, gguf_file)?;
    source.get(&name)
}

fn resolve_shards(source: &ModelSource) -> Result<Vec<PathBuf>> {
    let files = source.list_files()?;
    if files.iter().any(|f| f == SAFETENSORS_FILE) {
        Ok(vec![source.get(SAFETENSORS_FILE)?])
    } else if files.iter().any(|f| f == SAFETENSORS_INDEX_FILE) {
        let index_path = source.get(SAFETENSORS_INDEX_FILE)?;
        let bytes = std::fs::read(&index_path)
            .with_context(|| format!("read {}", index_path.display()))?;
        shard_names(&bytes)?
            .iter()
            .map(|name| source.get(name))
            .collect()
    } else {
        bail!("no {SAFETENSORS_FILE} or {SAFETENSORS_INDEX_FILE} found");
    }
}

fn resolve_weights(
    source: &ModelSource,
    quantization: Option<Quantization>,
    gguf_file: Option<&str>,
) -> Result<WeightFiles> {
    match quantization {
        Some(Quantization::Int8) => Ok(WeightFiles::Gguf(resolve_gguf(source, gguf_file)?)),
        None => {
            let config = source.get(CONFIG_FILE)?;
            let shards = resolve_shards(source)?;
            Ok(WeightFiles::Safetensors { config, shards })
        }
    }
}

/// Read `config.json` and decide the architecture before any shard is fetched.
fn read_config(source: &ModelSource) -> Result<(Vec<u8>, ConfigSummary)> {
    let path = source.get(CONFIG_FILE)?;
    let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let summary =
        ConfigSummary::from_json(&bytes).with_context(|| format!("load {}", path.display()))?;
    Ok((bytes, summary))
}

// ---------------------------------------------------------------------------
// Device / dtype
// ---------------------------------------------------------------------------

fn resolve_device(map: DeviceMap, forced: Option<&Device>) -> Result<Device> {
    if let Some(device) = forced {
        return Ok(device.clone());
    }
    match map {
        DeviceMap::Auto => crate::default_device(),
        DeviceMap::Cpu => Ok(Device::Cpu),
    }
}

/// bf16 and f16 are only requested from accelerators; on CPU the weights
/// are loaded as f32.
pub fn resolve_dtype(precision: Precision, device: &Device) -> DType {
    let dtype = precision.dtype();
    if device.is_cpu() && dtype != DType::F32 {
        tracing::warn!(requested = ?dtype, "half precision on CPU, loading f32 instead");
        return DType::F32;
    }
    dtype
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// [`ModelLoader`] backed by candle and the HuggingFace Hub.
#[derive(Debug, Clone, Default)]
pub struct HubLoader {
    revision: Option<String>,
    gguf_file: Option<String>,
    seed: Option<u64>,
    device: Option<Device>,
}

impl HubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// HF revision / branch. Default: "main".
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Exact GGUF file name to use for quantized loads.
    pub fn with_gguf_file(mut self, name: impl Into<String>) -> Self {
        self.gguf_file = Some(name.into());
        self
    }

    /// Seed for sampling. Random when unset.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Place the model on `device` regardless of the requested device map.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    fn source(&self, model_id: &str) -> Result<ModelSource> {
        ModelSource::open(model_id, self.revision.as_deref())
    }

    pub fn tokenizer_path(&self, model_id: &str) -> Result<PathBuf> {
        self.source(model_id)?.get(TOKENIZER_FILE)
    }

    /// Resolve (downloading if needed) the weight files a load would use.
    pub fn weight_files(
        &self,
        model_id: &str,
        quantization: Option<Quantization>,
    ) -> Result<WeightFiles> {
        let source = self.source(model_id)?;
        resolve_weights(&source, quantization, self.gguf_file.as_deref())
    }
}

impl ModelLoader for HubLoader {
    fn load_tokenizer(&self, model_id: &str) -> Result<Box<dyn TextTokenizer>> {
        let path = self.tokenizer_path(model_id)?;
        tracing::info!(path = %path.display(), "loading tokenizer");
        Ok(Box::new(TokenizerWrapper::from_file(&path)?))
    }

    fn load_model(&self, model_id: &str, options: &LoadOptions) -> Result<Box<dyn CausalLm>> {
        let source = self.source(model_id)?;
        let device = resolve_device(options.device_map, self.device.as_ref())?;

        let (model, eos_token_id): (Box<dyn Model>, Option<u32>) = match options.quantization {
            Some(Quantization::Int8) => {
                let path = resolve_gguf(&source, self.gguf_file.as_deref())?;
                tracing::info!(
                    path = %path.display(),
                    device = ?device,
                    "loading 8-bit GGUF weights"
                );
                let (model, eos) = QuantizedLlama::load(&path, &device)?;
                (Box::new(model), eos)
            }
            None => {
                let (config_json, summary) = read_config(&source)?;
                let shards = resolve_shards(&source)?;
                let dtype = resolve_dtype(options.precision, &device);
                tracing::info!(
                    architecture = ?summary.architecture,
                    shards = shards.len(),
                    dtype = ?dtype,
                    device = ?device,
                    "loading safetensors weights"
                );
                let model: Box<dyn Model> = match summary.architecture {
                    Architecture::Llama => {
                        Box::new(SafetensorsLlama::load(&config_json, &shards, dtype, &device)?)
                    }
                    Architecture::Falcon => {
                        Box::new(SafetensorsFalcon::load(&config_json, &shards, dtype, &device)?)
                    }
                };
                (model, summary.eos_token_id)
            }
        };

        let eos_token_id = match eos_token_id {
            Some(id) => Some(id),
            None => TokenizerWrapper::from_file(&source.get(TOKENIZER_FILE)?)?.eos_token_id(),
        };
        let seed = self.seed.unwrap_or_else(rand::random);
        Ok(Box::new(CandleCausalLm::new(model, eos_token_id, seed)))
    }
}

// ---------------------------------------------------------------------------
// GGUF metadata
// ---------------------------------------------------------------------------

/// Metadata extracted from a GGUF file without loading the full weights.
pub struct GgufMetadata {
    pub architecture: String,
    pub name: String,
    pub param_count: u64,
    pub context_length: u64,
    pub block_count: u64,
    pub quantization: String,
    pub file_size: u64,
}

/// Read GGUF metadata without loading weights.
pub fn read_gguf_metadata(path: &Path) -> Result<GgufMetadata> {
    let file_size = std::fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    let mut file =
        std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let content = gguf_file::Content::read(&mut file)
        .map_err(|e| anyhow::anyhow!("failed to read GGUF: {e}"))?;

    let architecture = metadata_str(&content, "general.architecture")
        .unwrap_or_default()
        .to_string();
    let name = metadata_str(&content, "general.name")
        .unwrap_or_default()
        .to_string();
    let arch = if architecture.is_empty() {
        "llama"
    } else {
        architecture.as_str()
    };
    let context_length =
        metadata_u32(&content, &format!("{arch}.context_length")).unwrap_or(0) as u64;
    let block_count = metadata_u32(&content, &format!("{arch}.block_count")).unwrap_or(0) as u64;

    let param_count: u64 = content
        .tensor_infos
        .values()
        .map(|t| t.shape.elem_count() as u64)
        .sum();

    // Detect quantization from the first large tensor's dtype.
    let quantization = content
        .tensor_infos
        .values()
        .filter(|t| t.shape.elem_count() > 1000)
        .map(|t| format!("{:?}", t.ggml_dtype))
        .next()
        .unwrap_or_else(|| "unknown".to_string());

    Ok(GgufMetadata {
        architecture,
        name,
        param_count,
        context_length,
        block_count,
        quantization,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GenerationParams, TokenizedInput};
    use crate::tokenizer::tests::WORD_LEVEL_JSON;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").expect("write file");
    }

    fn local_loader(dir: &Path) -> (HubLoader, String) {
        (HubLoader::new(), dir.to_string_lossy().into_owned())
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let err = ModelSource::open("", None).err().expect("should fail");
        assert!(err.to_string().contains("no model identifier"));
    }

    #[test]
    fn single_safetensors_resolves() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), SAFETENSORS_FILE);
        let (loader, id) = local_loader(dir.path());

        let files = loader.weight_files(&id, None).expect("resolve");
        assert_eq!(
            files,
            WeightFiles::Safetensors {
                config: dir.path().join(CONFIG_FILE),
                shards: vec![dir.path().join(SAFETENSORS_FILE)],
            }
        );
    }

    #[test]
    fn sharded_safetensors_resolve_from_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), "model-00001-of-00002.safetensors");
        touch(dir.path(), "model-00002-of-00002.safetensors");
        std::fs::write(
            dir.path().join(SAFETENSORS_INDEX_FILE),
            br#"{"metadata": {}, "weight_map": {
                "a": "model-00002-of-00002.safetensors",
                "b": "model-00001-of-00002.safetensors",
                "c": "model-00001-of-00002.safetensors"
            }}"#,
        )
        .expect("write index");
        let (loader, id) = local_loader(dir.path());

        match loader.weight_files(&id, None).expect("resolve") {
            WeightFiles::Safetensors { shards, .. } => assert_eq!(
                shards,
                vec![
                    dir.path().join("model-00001-of-00002.safetensors"),
                    dir.path().join("model-00002-of-00002.safetensors"),
                ]
            ),
            other => panic!("unexpected weights {other:?}"),
        }
    }

    #[test]
    fn missing_weights_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), CONFIG_FILE);
        let (loader, id) = local_loader(dir.path());
        let err = loader.weight_files(&id, None).expect_err("should fail");
        assert!(err.to_string().contains("model.safetensors"));
    }

    #[test]
    fn quantized_picks_q8_gguf() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "model.Q4_K_M.gguf");
        touch(dir.path(), "model.Q8_0.gguf");
        let (loader, id) = local_loader(dir.path());

        let files = loader
            .weight_files(&id, Some(Quantization::Int8))
            .expect("resolve");
        assert_eq!(files, WeightFiles::Gguf(dir.path().join("model.Q8_0.gguf")));
    }

    #[test]
    fn quantized_without_q8_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "model.Q4_K_M.gguf");
        let (loader, id) = local_loader(dir.path());
        let err = loader
            .weight_files(&id, Some(Quantization::Int8))
            .expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("q8_0"));
        assert!(msg.contains(&id));
        assert!(msg.contains("--gguf-file"));
    }

    #[test]
    fn explicit_gguf_file_wins() {
        let files = vec!["a.Q8_0.gguf".to_string()];
        assert_eq!(
            pick_q8_gguf("repo", &files, Some("custom.gguf")).unwrap(),
            "custom.gguf"
        );
        assert_eq!(pick_q8_gguf("repo", &files, None).unwrap(), "a.Q8_0.gguf");
    }

    #[test]
    fn spinner_is_cleared_when_fetch_fails() {
        let pb = ProgressBar::hidden();
        let result: Result<(), &str> = with_spinner(&pb, || Err("offline"));
        assert_eq!(result, Err("offline"));
        assert!(pb.is_finished());
    }

    #[test]
    fn shard_index_without_entries_is_error() {
        assert!(shard_names(br#"{"weight_map": {}}"#).is_err());
    }

    #[test]
    fn loads_tokenizer_from_local_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(TOKENIZER_FILE), WORD_LEVEL_JSON).expect("write");
        let (loader, id) = local_loader(dir.path());
        let tok = loader.load_tokenizer(&id).expect("load tokenizer");
        let input = tok.encode("hello", &Device::Cpu).expect("encode");
        assert_eq!(input.ids().unwrap(), vec![1]);
    }

    #[test]
    fn half_precision_falls_back_to_f32_on_cpu() {
        assert_eq!(resolve_dtype(Precision::Bf16, &Device::Cpu), DType::F32);
        assert_eq!(resolve_dtype(Precision::F32, &Device::Cpu), DType::F32);
    }

    #[test]
    fn forced_device_overrides_map() {
        let device = resolve_device(DeviceMap::Auto, Some(&Device::Cpu)).unwrap();
        assert!(device.is_cpu());
    }

    fn write_tokenizer(dir: &Path) {
        std::fs::write(dir.join(TOKENIZER_FILE), WORD_LEVEL_JSON).expect("write tokenizer");
    }

    fn randn<S: Into<candle_core::Shape>>(shape: S) -> candle_core::Tensor {
        candle_core::Tensor::randn(0f32, 0.5, shape, &Device::Cpu).expect("randn")
    }

    /// One-layer multi-query Falcon with hidden size 8 and a 4-token vocab.
    fn write_tiny_falcon(dir: &Path) {
        use candle_core::Tensor;

        std::fs::write(
            dir.join(CONFIG_FILE),
            br#"{
                "model_type": "falcon",
                "architectures": ["FalconForCausalLM"],
                "vocab_size": 4,
                "hidden_size": 8,
                "num_hidden_layers": 1,
                "num_attention_heads": 2,
                "layer_norm_epsilon": 1e-5,
                "bos_token_id": 3,
                "eos_token_id": 3,
                "alibi": false,
                "new_decoder_architecture": false,
                "multi_query": true,
                "parallel_attn": true,
                "bias": false
            }"#,
        )
        .expect("write config");

        let (vocab, hidden, head_dim) = (4, 8, 4);
        let ones = || Tensor::ones(hidden, DType::F32, &Device::Cpu).expect("ones");
        let zeros = || Tensor::zeros(hidden, DType::F32, &Device::Cpu).expect("zeros");
        let tensors: std::collections::HashMap<String, Tensor> = [
            ("transformer.word_embeddings.weight", randn((vocab, hidden))),
            ("transformer.h.0.input_layernorm.weight", ones()),
            ("transformer.h.0.input_layernorm.bias", zeros()),
            (
                "transformer.h.0.self_attention.query_key_value.weight",
                randn((hidden + 2 * head_dim, hidden)),
            ),
            ("transformer.h.0.self_attention.dense.weight", randn((hidden, hidden))),
            ("transformer.h.0.mlp.dense_h_to_4h.weight", randn((4 * hidden, hidden))),
            ("transformer.h.0.mlp.dense_4h_to_h.weight", randn((hidden, 4 * hidden))),
            ("transformer.ln_f.weight", ones()),
            ("transformer.ln_f.bias", zeros()),
            ("lm_head.weight", randn((vocab, hidden))),
        ]
        .into_iter()
        .map(|(name, t)| (name.to_string(), t))
        .collect();
        candle_core::safetensors::save(&tensors, dir.join(SAFETENSORS_FILE))
            .expect("save safetensors");
    }

    #[test]
    fn falcon_checkpoint_loads_and_generates() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_tokenizer(dir.path());
        write_tiny_falcon(dir.path());
        let (loader, id) = local_loader(dir.path());
        let loader = loader.with_device(Device::Cpu).with_seed(1);

        let mut lm = loader
            .load_model(&id, &LoadOptions::pretrained(false))
            .expect("load falcon");
        let input = TokenizedInput::from_ids(&[1, 2], &Device::Cpu).unwrap();
        let params = GenerationParams {
            do_sample: true,
            temperature: Some(0.0),
            top_p: None,
            max_new_tokens: Some(3),
        };

        let sequences = lm.generate(&input, &params).expect("generate");
        let tokens = &sequences[0];
        assert_eq!(&tokens[..2], &[1, 2]);
        assert!((3..=5).contains(&tokens.len()));
        assert!(tokens.iter().all(|&t| t < 4));
    }

    #[test]
    fn eos_from_config_needs_no_tokenizer() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_tiny_falcon(dir.path());
        let (loader, id) = local_loader(dir.path());
        let loader = loader.with_device(Device::Cpu).with_seed(1);

        let mut lm = loader
            .load_model(&id, &LoadOptions::pretrained(false))
            .expect("load without tokenizer.json");
        let input = TokenizedInput::from_ids(&[0], &Device::Cpu).unwrap();
        let params = GenerationParams {
            do_sample: false,
            temperature: None,
            top_p: None,
            max_new_tokens: Some(1),
        };
        assert_eq!(lm.generate(&input, &params).expect("generate")[0].len(), 2);
    }

    #[test]
    fn unsupported_architecture_fails_before_weights() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_tokenizer(dir.path());
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            br#"{"model_type": "gpt2", "architectures": ["GPT2LMHeadModel"]}"#,
        )
        .expect("write config");
        let (loader, id) = local_loader(dir.path());
        let loader = loader.with_device(Device::Cpu);

        let err = loader
            .load_model(&id, &LoadOptions::pretrained(false))
            .err()
            .expect("should fail");
        assert!(format!("{err:#}").contains("unsupported architecture gpt2"));
    }
}
