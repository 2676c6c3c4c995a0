// Model loaders: Candle (quantized local inference)

pub mod candle;

pub use candle::CandleLoader;
#[cfg(feature = "candle")]
pub use candle::LocalModel;
