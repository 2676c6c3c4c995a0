// Candle Model Loader - native Rust inference for the local variant
//
// download (hf-hub) -> quantize to 4 bits in memory -> quantized Mistral/Llama
// model on the best available device. Loading and generation are blocking and
// run on tokio's blocking pool.

use anyhow::Result;
use std::sync::Arc;

use super::super::download::ModelDownloader;
use super::super::generation::GenerationConfig;
use super::super::quantize::QuantizationConfig;
use crate::llms::{ModelLoader, LLM};

/// Builds local backends from HuggingFace model identifiers
#[derive(Clone)]
#[cfg_attr(not(feature = "candle"), allow(dead_code))]
pub struct CandleLoader {
    downloader: ModelDownloader,
    quantization: QuantizationConfig,
    generation: GenerationConfig,
}

impl CandleLoader {
    pub fn new(
        hf_token: Option<String>,
        quantization: QuantizationConfig,
        generation: GenerationConfig,
    ) -> Result<Self> {
        quantization.validate()?;
        generation.validate()?;
        Ok(Self {
            downloader: ModelDownloader::new(hf_token),
            quantization,
            generation,
        })
    }

    /// Loader with the service's fixed pipeline parameters
    pub fn with_defaults(hf_token: Option<String>) -> Result<Self> {
        Self::new(
            hf_token,
            QuantizationConfig::default(),
            GenerationConfig::default(),
        )
    }
}

#[cfg(feature = "candle")]
#[async_trait::async_trait]
impl ModelLoader for CandleLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn LLM>> {
        use anyhow::Context;

        let loader = self.clone();
        let model_id = model_id.to_string();
        let model = tokio::task::spawn_blocking(move || local::build(&loader, &model_id))
            .await
            .context("Model loading task panicked")??;
        Ok(Arc::new(model))
    }
}

// Placeholder when candle feature is disabled
#[cfg(not(feature = "candle"))]
#[async_trait::async_trait]
impl ModelLoader for CandleLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn LLM>> {
        anyhow::bail!(
            "Cannot load {}: built without the `candle` feature",
            model_id
        )
    }
}

#[cfg(feature = "candle")]
pub use local::LocalModel;

#[cfg(feature = "candle")]
mod local {
    use anyhow::{anyhow, Context, Result};
    use candle_core::{DType, Device, Tensor};
    use candle_transformers::generation::{LogitsProcessor, Sampling};
    use candle_transformers::models::mistral::Config as MistralConfig;
    use candle_transformers::models::quantized_mistral::Model as QuantizedMistral;
    use candle_transformers::quantized_var_builder::VarBuilder;
    use candle_transformers::utils::apply_repeat_penalty;
    use std::path::Path;
    use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
    use tokenizers::Tokenizer;

    use super::CandleLoader;
    use crate::chat::Turn;
    use crate::llms::LLM;
    use crate::models::chat_template::{render_instruct, EOS};
    use crate::models::generation::GenerationConfig;
    use crate::models::quantize::{quantize_shards, to_gguf_buffer};

    /// Architectures sharing the Mistral tensor layout
    const SUPPORTED_MODEL_TYPES: &[&str] = &["mistral", "llama"];
    const DEFAULT_ROPE_THETA: f64 = 10_000.0;

    pub(super) fn build(loader: &CandleLoader, model_id: &str) -> Result<LocalModel> {
        let files = loader.downloader.fetch(model_id)?;
        let config = read_config(&files.config)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        let eos_token_id = tokenizer
            .token_to_id(EOS)
            .with_context(|| format!("Tokenizer for {} has no {} token", model_id, EOS))?;

        let device = Device::cuda_if_available(0).context("Failed to initialize device")?;
        tracing::info!("Loading {} on {:?}", model_id, device);

        // Weights are read on the CPU one shard at a time, quantized, then moved to the device.
        let shards = files.weights.iter().map(|path| {
            candle_core::safetensors::load(path, &Device::Cpu)
                .with_context(|| format!("Failed to read weights {}", path.display()))
        });
        let quantized = quantize_shards(shards, &loader.quantization)?;
        let buffer = to_gguf_buffer(&quantized)?;
        drop(quantized);

        let vb = VarBuilder::from_gguf_buffer(&buffer, &device)
            .context("Failed to load quantized weights")?;
        let model =
            QuantizedMistral::new(&config, vb).context("Failed to build quantized model")?;

        tracing::info!("Model {} ready", model_id);

        Ok(LocalModel {
            name: format!("local:{}", model_id),
            generation: loader.generation.clone(),
            inner: Arc::new(Mutex::new(LocalModelInner {
                model,
                tokenizer,
                device,
                eos_token_id,
            })),
        })
    }

    fn read_config(path: &Path) -> Result<MistralConfig> {
        let raw = std::fs::read_to_string(path).context("Failed to read config.json")?;
        parse_config(&raw)
    }

    /// Parse a HuggingFace `config.json`, filling fields Llama checkpoints omit
    pub(super) fn parse_config(raw: &str) -> Result<MistralConfig> {
        let mut value: serde_json::Value =
            serde_json::from_str(raw).context("Failed to parse config.json")?;
        let object = value
            .as_object_mut()
            .context("config.json is not a JSON object")?;

        let model_type = object
            .get("model_type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        if !SUPPORTED_MODEL_TYPES.contains(&model_type.as_str()) {
            anyhow::bail!(
                "Unsupported model type '{}' (supported: {})",
                model_type,
                SUPPORTED_MODEL_TYPES.join(", ")
            );
        }

        object
            .entry("rope_theta")
            .or_insert(serde_json::json!(DEFAULT_ROPE_THETA));
        object
            .entry("use_flash_attn")
            .or_insert(serde_json::json!(false));

        serde_json::from_value(value).context("config.json is missing required fields")
    }

    /// Quantized causal LM implementing the generation capability
    pub struct LocalModel {
        name: String,
        generation: GenerationConfig,
        inner: Arc<Mutex<LocalModelInner>>,
    }

    struct LocalModelInner {
        model: QuantizedMistral,
        tokenizer: Tokenizer,
        device: Device,
        eos_token_id: u32,
    }

    impl LocalModelInner {
        fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String> {
            self.model.clear_kv_cache();

            let encoding = self
                .tokenizer
                .encode(prompt, true)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
            let mut tokens = encoding.get_ids().to_vec();
            let prompt_len = tokens.len();

            let sampling = if config.do_sample {
                Sampling::All {
                    temperature: config.temperature,
                }
            } else {
                Sampling::ArgMax
            };
            let mut logits_processor = LogitsProcessor::from_sampling(rand::random(), sampling);

            for index in 0..config.max_new_tokens {
                // Full prompt on the first step, then one token at a time against the KV cache
                let context_size = if index > 0 { 1 } else { tokens.len() };
                let start_pos = tokens.len().saturating_sub(context_size);
                let input = Tensor::new(&tokens[start_pos..], &self.device)?.unsqueeze(0)?;

                let logits = self
                    .model
                    .forward(&input, start_pos)
                    .context("Forward pass failed")?;
                let logits = logits.squeeze(0)?.squeeze(0)?.to_dtype(DType::F32)?;
                let logits = if config.repetition_penalty == 1.0 {
                    logits
                } else {
                    let start_at = tokens.len().saturating_sub(config.repeat_last_n);
                    apply_repeat_penalty(&logits, config.repetition_penalty, &tokens[start_at..])?
                };

                let next_token = logits_processor.sample(&logits)?;
                if next_token == self.eos_token_id {
                    break;
                }
                tokens.push(next_token);
            }

            let output = if config.return_full_text {
                &tokens[..]
            } else {
                &tokens[prompt_len..]
            };
            self.tokenizer
                .decode(output, true)
                .map_err(|e| anyhow!("Decode failed: {}", e))
        }
    }

    #[async_trait::async_trait]
    impl LLM for LocalModel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn generate(&self, turns: &[Turn]) -> Result<String> {
            let prompt = render_instruct(turns);
            let inner = Arc::clone(&self.inner);
            let config = self.generation.clone();

            tokio::task::spawn_blocking(move || {
                let mut inner = lock_recovering(&inner, |inner| inner.model.clear_kv_cache());
                inner.generate(&prompt, &config)
            })
            .await
            .context("Generation task panicked")?
        }

        fn release_resources(&self) {
            // A busy model is being used by another request, which releases it itself.
            match self.inner.try_lock() {
                Ok(mut inner) => inner.model.clear_kv_cache(),
                Err(TryLockError::Poisoned(poisoned)) => {
                    poisoned.into_inner().model.clear_kv_cache();
                }
                Err(TryLockError::WouldBlock) => {}
            }
        }
    }

    /// Lock, taking over a lock poisoned by a panicked generation.
    ///
    /// `reset` runs on the recovered state before it is handed out.
    pub(super) fn lock_recovering<T>(
        mutex: &Mutex<T>,
        reset: impl FnOnce(&mut T),
    ) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Recovering local model after a panicked generation");
                mutex.clear_poison();
                let mut guard = poisoned.into_inner();
                reset(&mut guard);
                guard
            }
        }
    }
}


#[cfg(all(test, feature = "candle"))]
mod local_tests {
    use super::local::{lock_recovering, parse_config};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_lock_recovers_after_panicked_holder() {
        let state = Arc::new(Mutex::new(vec![1u32, 2, 3]));

        let poisoner = Arc::clone(&state);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("forward pass blew up");
        })
        .join();
        assert!(joined.is_err());
        assert!(state.is_poisoned());

        let mut resets = 0;
        {
            let guard = lock_recovering(&state, |cache| {
                resets += 1;
                cache.clear();
            });
            assert!(guard.is_empty());
        }
        assert_eq!(resets, 1);
        assert!(!state.is_poisoned());

        // A healthy lock is handed out untouched
        let guard = lock_recovering(&state, |_| panic!("no reset expected"));
        assert!(guard.is_empty());
    }

    const MISTRAL_CONFIG: &str = r#"{
        "architectures": ["MistralForCausalLM"],
        "hidden_act": "silu",
        "hidden_size": 4096,
        "intermediate_size": 14336,
        "max_position_embeddings": 32768,
        "model_type": "mistral",
        "num_attention_heads": 32,
        "num_hidden_layers": 32,
        "num_key_value_heads": 8,
        "rms_norm_eps": 1e-05,
        "rope_theta": 1000000.0,
        "sliding_window": null,
        "vocab_size": 32000
    }"#;

    #[test]
    fn test_parse_mistral_config() {
        let config = parse_config(MISTRAL_CONFIG).unwrap();
        assert_eq!(config.hidden_size, 4096);
        assert_eq!(config.num_key_value_heads, 8);
        assert_eq!(config.rope_theta, 1_000_000.0);
    }

    #[test]
    fn test_parse_llama_config_fills_rope_theta() {
        let raw = r#"{
            "hidden_act": "silu",
            "hidden_size": 64,
            "intermediate_size": 128,
            "max_position_embeddings": 2048,
            "model_type": "llama",
            "num_attention_heads": 4,
            "num_hidden_layers": 2,
            "num_key_value_heads": 4,
            "rms_norm_eps": 1e-06,
            "vocab_size": 32000
        }"#;
        let config = parse_config(raw).unwrap();
        assert_eq!(config.rope_theta, 10_000.0);
    }

    #[test]
    fn test_parse_config_rejects_other_architectures() {
        let raw = r#"{"model_type": "qwen2", "hidden_size": 64}"#;
        let err = parse_config(raw).unwrap_err();
        assert!(err.to_string().contains("Unsupported model type 'qwen2'"));
    }
}
