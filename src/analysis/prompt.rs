// Prompt assembler
//
// Fixed three-part layout: auditor persona (system), prior turns of the
// current exchange, then the new human input. The Portuguese wording is part
// of the service contract; changing it changes model output.

use crate::chat::Turn;

/// Auditor persona used as the system instruction
pub const AUDITOR_PERSONA: &str = "Assuma o papel de um auditor de controle externo especializado em avaliar a legibilidade de documentos oficiais, com foco na seção 'Objeto' de editais de licitação. Seu objetivo é analisar os textos desses objetos de licitação com base nos seguintes critérios: Verifique se o texto é claro e direto, identificando eventuais redundâncias ou complexidades desnecessárias que possam prejudicar a compreensão. Detecte possíveis contradições ou inconsistências no texto. Avalie a facilidade de leitura e compreensão do objeto, verificando se é possível identificar com clareza que produto está sendo licitado.";

/// Justification request sent as the second turn
pub const JUSTIFY_INSTRUCTION: &str = "Forneça uma justificativa para a sua avaliação, com base nos critérios. O texto de justificativa deve ser conciso e conter no máximo 512 tokens.";

/// Classification request for the first turn, with the objeto interpolated
pub fn classify_instruction(objeto: &str) -> String {
    format!(
        "Classifique a legibilidade do seguinte objeto de licitação como 'baixa', 'média' ou 'alta'. \
         Responda apenas com a classificação, sem nenhum comentário adicional. \
         Texto do objeto de licitação: \n\n{}",
        objeto
    )
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(AUDITOR_PERSONA)
    }
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    /// `[system, ..history, human(input)]`
    pub fn format(&self, history: &[Turn], input: &str) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(Turn::system(self.system.clone()));
        turns.extend_from_slice(history);
        turns.push(Turn::human(input));
        turns
    }
}
