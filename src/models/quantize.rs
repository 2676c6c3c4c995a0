// In-memory 4-bit weight quantization
//
// Full-precision safetensors weights are compressed on load so a 7B model fits
// in a small accelerator. Q4K stores 4-bit values in 32-wide blocks whose
// scales and minimums are themselves quantized to 6 bits inside 256-wide
// super-blocks (double quantization). Matrices whose rows are not a multiple
// of the block width fall back to Q8_0, then to F32. Norm vectors and other
// 1-D tensors stay F32. The result is packed into a GGUF buffer that candle's
// quantized var-builder reads directly.

use anyhow::Result;

/// 4-bit block layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// k-quant, 4-bit with quantized super-block scales
    Q4K,
    /// Legacy 4-bit blocks with f16 scales
    Q4_0,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationConfig {
    pub bits: u8,
    pub double_quant: bool,
    pub block_type: BlockType,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            bits: 4,
            double_quant: true,
            block_type: BlockType::Q4K,
        }
    }
}

impl QuantizationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bits != 4 {
            anyhow::bail!("Only 4-bit quantization is supported (got {} bits)", self.bits);
        }
        if self.double_quant && self.block_type != BlockType::Q4K {
            anyhow::bail!("Double quantization requires the Q4K block type");
        }
        Ok(())
    }
}

#[cfg(feature = "candle")]
pub use self::packing::{choose_dtype, quantize_shards, quantize_weights, to_gguf_buffer};

#[cfg(feature = "candle")]
mod packing {
    use anyhow::{Context, Result};
    use candle_core::quantized::{gguf_file, GgmlDType, QTensor};
    use candle_core::{DType, Tensor};
    use std::collections::HashMap;
    use std::io::Cursor;

    use super::{BlockType, QuantizationConfig};

    impl BlockType {
        pub fn ggml_dtype(self) -> GgmlDType {
            match self {
                BlockType::Q4K => GgmlDType::Q4K,
                BlockType::Q4_0 => GgmlDType::Q4_0,
            }
        }
    }

    /// Storage type for a tensor of the given shape
    pub fn choose_dtype(shape: &[usize], preferred: GgmlDType) -> GgmlDType {
        match shape {
            [_, cols] if cols % preferred.block_size() == 0 => preferred,
            [_, cols] if cols % GgmlDType::Q8_0.block_size() == 0 => GgmlDType::Q8_0,
            _ => GgmlDType::F32,
        }
    }

    /// Quantize every tensor, consuming the full-precision map as it goes.
    ///
    /// Output is sorted by name so the GGUF layout is deterministic.
    pub fn quantize_weights(
        tensors: HashMap<String, Tensor>,
        config: &QuantizationConfig,
    ) -> Result<Vec<(String, QTensor)>> {
        config.validate()?;
        let preferred = config.block_type.ggml_dtype();

        let mut names: Vec<String> = tensors.keys().cloned().collect();
        names.sort();
        let mut tensors = tensors;

        let mut quantized = Vec::with_capacity(names.len());
        let mut fallbacks = 0usize;
        for name in names {
            let Some(tensor) = tensors.remove(&name) else {
                continue;
            };
            let dtype = choose_dtype(tensor.dims(), preferred);
            if tensor.rank() == 2 && dtype != preferred {
                fallbacks += 1;
            }

            let tensor = tensor.to_dtype(DType::F32)?;
            let qtensor = QTensor::quantize(&tensor, dtype)
                .with_context(|| format!("Failed to quantize {} to {:?}", name, dtype))?;
            quantized.push((name, qtensor));
        }

        tracing::info!(
            tensors = quantized.len(),
            fallbacks,
            "Quantized weights to {:?}",
            preferred
        );
        Ok(quantized)
    }

    /// Quantize checkpoint shards one at a time.
    ///
    /// Each shard is pulled from the iterator only after the previous one has
    /// been quantized and dropped, so at most one shard is held at full precision.
    pub fn quantize_shards<I>(
        shards: I,
        config: &QuantizationConfig,
    ) -> Result<Vec<(String, QTensor)>>
    where
        I: IntoIterator<Item = Result<HashMap<String, Tensor>>>,
    {
        let mut quantized = Vec::new();
        for (index, shard) in shards.into_iter().enumerate() {
            let shard = shard?;
            tracing::debug!(shard = index, tensors = shard.len(), "Quantizing shard");
            quantized.extend(quantize_weights(shard, config)?);
        }
        quantized.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(quantized)
    }

    /// Serialize quantized tensors into an in-memory GGUF file
    pub fn to_gguf_buffer(tensors: &[(String, QTensor)]) -> Result<Vec<u8>> {
        let refs: Vec<(&str, &QTensor)> = tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
            .collect();

        let mut cursor = Cursor::new(Vec::new());
        gguf_file::write(&mut cursor, &[], &refs).context("Failed to write GGUF buffer")?;
        Ok(cursor.into_inner())
    }
}
