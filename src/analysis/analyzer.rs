// Two-turn readability protocol
//
// 1. classify: ask for exactly one of baixa / média / alta
// 2. justify: ask for a short justification, with turn 1 as context
//
// Outputs are passed through verbatim. The classification is not checked
// against the three allowed labels. If either turn fails the whole analysis
// fails and nothing partial is returned.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::chain::AnalysisChain;
use super::prompt::{classify_instruction, PromptTemplate, JUSTIFY_INSTRUCTION};
use crate::llms::{ReleaseGuard, LLM};

/// Readability verdict for one objeto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub clf_legibilidade: String,
    pub justificativa: String,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectAnalyzer {
    prompt: PromptTemplate,
}

impl ObjectAnalyzer {
    pub fn new(prompt: PromptTemplate) -> Self {
        Self { prompt }
    }

    pub async fn analyze(&self, llm: &dyn LLM, objeto: &str) -> Result<AnalysisResult> {
        let _release = ReleaseGuard::new(llm);
        let mut chain = AnalysisChain::new(&self.prompt, llm);

        let clf_legibilidade = chain
            .invoke(&classify_instruction(objeto))
            .await
            .context("Classification turn failed")?;
        tracing::debug!("Classification: {:?}", clf_legibilidade);

        let justificativa = chain
            .invoke(JUSTIFY_INSTRUCTION)
            .await
            .context("Justification turn failed")?;

        Ok(AnalysisResult {
            clf_legibilidade,
            justificativa,
        })
    }
}
