// Generation parameters for the local text-generation pipeline

use anyhow::Result;

use crate::config::constants::{
    LOCAL_MAX_NEW_TOKENS, LOCAL_REPEAT_LAST_N, LOCAL_REPETITION_PENALTY, LOCAL_TEMPERATURE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature (ignored when `do_sample` is false)
    pub temperature: f64,
    /// Hard cap on generated tokens per turn
    pub max_new_tokens: usize,
    /// Sample from the distribution instead of greedy argmax
    pub do_sample: bool,
    /// Penalty applied to logits of recently seen tokens (1.0 disables it)
    pub repetition_penalty: f32,
    /// Window of trailing tokens the penalty considers
    pub repeat_last_n: usize,
    /// Echo the prompt in the output
    pub return_full_text: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: LOCAL_TEMPERATURE,
            max_new_tokens: LOCAL_MAX_NEW_TOKENS,
            do_sample: true,
            repetition_penalty: LOCAL_REPETITION_PENALTY,
            repeat_last_n: LOCAL_REPEAT_LAST_N,
            return_full_text: false,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_new_tokens == 0 {
            anyhow::bail!("max_new_tokens must be positive");
        }
        if self.do_sample && self.temperature <= 0.0 {
            anyhow::bail!("temperature must be positive when sampling");
        }
        if self.repetition_penalty <= 0.0 {
            anyhow::bail!("repetition_penalty must be positive");
        }
        Ok(())
    }
}
