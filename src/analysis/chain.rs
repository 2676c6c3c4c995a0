// Analysis chain: prompt template -> LLM -> plain text
//
// Owns an ephemeral history so consecutive invocations share context. The
// history only grows after a successful generation.

use anyhow::Result;

use super::prompt::PromptTemplate;
use crate::chat::{ChatHistory, Turn};
use crate::llms::LLM;

pub struct AnalysisChain<'a> {
    prompt: &'a PromptTemplate,
    llm: &'a dyn LLM,
    history: ChatHistory,
}

impl<'a> AnalysisChain<'a> {
    pub fn new(prompt: &'a PromptTemplate, llm: &'a dyn LLM) -> Self {
        Self {
            prompt,
            llm,
            history: ChatHistory::new(),
        }
    }

    /// Run one turn and record it in the history
    pub async fn invoke(&mut self, input: &str) -> Result<String> {
        let turns = self.prompt.format(self.history.turns(), input);
        tracing::debug!(
            backend = self.llm.name(),
            turns = turns.len(),
            "Invoking chain"
        );

        let output = self.llm.generate(&turns).await?;

        self.history.push_exchange(input, output.clone());
        Ok(output)
    }

    pub fn history(&self) -> &[Turn] {
        self.history.turns()
    }
}
