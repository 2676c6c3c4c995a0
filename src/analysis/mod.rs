// Readability analysis: prompt assembly, the invocable chain and the
// two-turn classify/justify protocol.

mod analyzer;
mod chain;
pub mod prompt;

pub use analyzer::{AnalysisResult, ObjectAnalyzer};
pub use chain::AnalysisChain;
pub use prompt::PromptTemplate;
