//! Materializes a tokenizer and model weights, then binds them into a pipeline.

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::llama::{Llama, LlamaConfig};
use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use super::{CausalLmPipeline, GenerationParams, LoadError};
use crate::config::ModelConfig;

const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_CONFIG_FILE: &str = "config.json";
const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";
const DEFAULT_REVISION: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    Tokenizer,
    Model,
    Pipeline,
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tokenizer => write!(f, "Step 1/3: Loading tokenizer..."),
            Self::Model => write!(f, "Step 2/3: Loading model..."),
            Self::Pipeline => write!(f, "Step 3/3: Initializing pipeline..."),
        }
    }
}

/// Where a model identifier points: a checkpoint directory or a hub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub { repo_id: String, revision: String },
}

impl ModelSource {
    #[must_use]
    pub fn resolve(model_name: &str) -> Self {
        let path = Path::new(model_name);
        if path.is_dir() {
            Self::Local(path.to_path_buf())
        } else {
            Self::Hub {
                repo_id: model_name.to_string(),
                revision: DEFAULT_REVISION.to_string(),
            }
        }
    }

    fn open(&self) -> Result<ModelFiles, LoadError> {
        match self {
            Self::Local(dir) => Ok(ModelFiles::Dir(dir.clone())),
            Self::Hub { repo_id, revision } => {
                let api = Api::new()?;
                let repo = api.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    revision.clone(),
                ));
                Ok(ModelFiles::Hub(repo))
            }
        }
    }
}

enum ModelFiles {
    Dir(PathBuf),
    Hub(ApiRepo),
}

#[derive(Deserialize)]
struct SafetensorsIndex {
    weight_map: HashMap<String, String>,
}

fn shard_names(index_path: &Path) -> Result<BTreeSet<String>, LoadError> {
    let index: SafetensorsIndex = serde_json::from_slice(&fs::read(index_path)?)?;
    Ok(index.weight_map.into_values().collect())
}

fn local_weight_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let index_path = dir.join(WEIGHTS_INDEX_FILE);
    let files: Vec<PathBuf> = if index_path.is_file() {
        shard_names(&index_path)?
            .into_iter()
            .map(|name| dir.join(name))
            .collect()
    } else {
        let pattern = dir.join("*.safetensors");
        let mut found: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(std::result::Result::ok)
            .collect();
        found.sort();
        found
    };

    if files.is_empty() {
        return Err(LoadError::NoWeights(dir.to_path_buf()));
    }
    Ok(files)
}

impl ModelFiles {
    fn get(&self, name: &str) -> Result<PathBuf, LoadError> {
        match self {
            Self::Dir(dir) => {
                let path = dir.join(name);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(LoadError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("{} not found", path.display()),
                    )))
                }
            }
            Self::Hub(repo) => Ok(repo.get(name)?),
        }
    }

    fn weights(&self) -> Result<Vec<PathBuf>, LoadError> {
        match self {
            Self::Dir(dir) => local_weight_files(dir),
            Self::Hub(repo) => match repo.get(WEIGHTS_INDEX_FILE) {
                Ok(index_path) => shard_names(&index_path)?
                    .iter()
                    .map(|name| repo.get(name).map_err(LoadError::from))
                    .collect(),
                Err(e) => {
                    tracing::debug!("No sharded weights index ({e}), using {SINGLE_WEIGHTS_FILE}");
                    Ok(vec![repo.get(SINGLE_WEIGHTS_FILE)?])
                }
            },
        }
    }
}

#[must_use]
pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}

pub struct ModelLoader {
    device: Device,
    dtype: DType,
}

impl ModelLoader {
    #[must_use]
    pub const fn new(device: Device) -> Self {
        Self {
            device,
            dtype: DType::F32,
        }
    }

    pub fn select_device(force_cpu: bool) -> Result<Device, LoadError> {
        if force_cpu {
            Ok(Device::Cpu)
        } else {
            Ok(Device::cuda_if_available(0)?)
        }
    }

    /// Loads tokenizer, then weights, then builds the pipeline. Any failure is final.
    pub fn load(
        &self,
        config: &ModelConfig,
        params: GenerationParams,
        mut progress: impl FnMut(LoadStep),
    ) -> Result<CausalLmPipeline, LoadError> {
        let source = ModelSource::resolve(&config.model_name);
        tracing::info!(?source, device = device_label(&self.device), "Loading model");
        let files = source.open()?;

        progress(LoadStep::Tokenizer);
        let tokenizer = Tokenizer::from_file(files.get(TOKENIZER_FILE)?)
            .map_err(|e| LoadError::Tokenizer(e.to_string()))?;

        progress(LoadStep::Model);
        let llama_config: LlamaConfig =
            serde_json::from_slice(&fs::read(files.get(MODEL_CONFIG_FILE)?)?)?;
        let model_config = llama_config.into_config(false);
        let weights = files.weights()?;
        tracing::debug!(shards = weights.len(), "Resolved weight files");
        let vb = self.map_weights(&weights)?;
        let model = Llama::load(vb, &model_config)?;

        progress(LoadStep::Pipeline);
        Ok(CausalLmPipeline::new(
            config.model_name.clone(),
            model,
            model_config,
            tokenizer,
            self.device.clone(),
            self.dtype,
            params,
        ))
    }

    #[allow(unsafe_code)]
    fn map_weights(&self, files: &[PathBuf]) -> Result<VarBuilder<'static>, LoadError> {
        // SAFETY: the safetensors files are not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(files, self.dtype, &self.device)? };
        Ok(vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_step_messages() {
        assert_eq!(LoadStep::Tokenizer.to_string(), "Step 1/3: Loading tokenizer...");
        assert_eq!(LoadStep::Model.to_string(), "Step 2/3: Loading model...");
        assert_eq!(
            LoadStep::Pipeline.to_string(),
            "Step 3/3: Initializing pipeline..."
        );
    }

    #[test]
    fn test_resolve_existing_directory_is_local() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let name = temp_dir.path().to_string_lossy().to_string();
        assert_eq!(
            ModelSource::resolve(&name),
            ModelSource::Local(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_resolve_repo_id_is_hub() {
        assert_eq!(
            ModelSource::resolve("TinyLlama/TinyLlama-1.1B-Chat-v1.0"),
            ModelSource::Hub {
                repo_id: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
                revision: "main".to_string(),
            }
        );
    }

    #[test]
    fn test_local_weights_from_index() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join(WEIGHTS_INDEX_FILE),
            r#"{"weight_map": {
                "a.weight": "model-00002-of-00002.safetensors",
                "b.weight": "model-00001-of-00002.safetensors",
                "c.weight": "model-00001-of-00002.safetensors"
            }}"#,
        )
        .expect("Failed to write index");

        let files = local_weight_files(temp_dir.path()).expect("Failed to resolve weights");
        assert_eq!(
            files,
            vec![
                temp_dir.path().join("model-00001-of-00002.safetensors"),
                temp_dir.path().join("model-00002-of-00002.safetensors"),
            ]
        );
    }

    #[test]
    fn test_local_weights_by_glob() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("model.safetensors"), b"").expect("write");
        fs::write(temp_dir.path().join("README.md"), b"").expect("write");

        let files = local_weight_files(temp_dir.path()).expect("Failed to resolve weights");
        assert_eq!(files, vec![temp_dir.path().join("model.safetensors")]);
    }

    #[test]
    fn test_local_weights_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err = local_weight_files(temp_dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoWeights(_)));
    }

    #[test]
    fn test_missing_tokenizer_fails_before_model_step() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = ModelConfig {
            model_name: temp_dir.path().to_string_lossy().to_string(),
            max_length: 50,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.1,
        };
        let params = config.generation_params(None, GenerationParams::DEFAULT_SEED);

        let mut steps = Vec::new();
        let result = ModelLoader::new(Device::Cpu).load(&config, params, |step| steps.push(step));

        assert!(matches!(result, Err(LoadError::Io(_))));
        assert_eq!(steps, vec![LoadStep::Tokenizer]);
    }

    #[test]
    fn test_cpu_device_label() {
        assert_eq!(device_label(&Device::Cpu), "cpu");
        let device = ModelLoader::select_device(true).expect("cpu device");
        assert!(device.is_cpu());
    }
}
