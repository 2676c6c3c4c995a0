// Local model support: download, quantization, prompt formatting, loading

pub mod chat_template;
pub mod download;
pub mod generation;
pub mod loaders;
pub mod quantize;

pub use download::{ModelDownloader, ModelFiles};
pub use generation::GenerationConfig;
pub use loaders::CandleLoader;
#[cfg(feature = "candle")]
pub use loaders::LocalModel;
pub use quantize::{BlockType, QuantizationConfig};
