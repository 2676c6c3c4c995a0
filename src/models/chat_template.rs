// Instruct chat template for Mistral/Llama-style checkpoints
//
// <s>[INST] {system}\n\n{user} [/INST] {assistant}</s>[INST] {user} [/INST]
//
// These models have no system role, so system text is folded into the first
// human turn. The tokenizer adds the leading <s>.

use crate::chat::{Role, Turn};

pub const INST_OPEN: &str = "[INST]";
pub const INST_CLOSE: &str = "[/INST]";
pub const EOS: &str = "</s>";

pub fn render_instruct(turns: &[Turn]) -> String {
    let system: Vec<&str> = turns
        .iter()
        .filter(|t| t.role == Role::System)
        .map(|t| t.content.as_str())
        .collect();
    let mut pending_system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };

    let mut prompt = String::new();
    for turn in turns {
        match turn.role {
            Role::System => {}
            Role::Human => {
                prompt.push_str(INST_OPEN);
                prompt.push(' ');
                if let Some(system) = pending_system.take() {
                    prompt.push_str(&system);
                    prompt.push_str("\n\n");
                }
                prompt.push_str(&turn.content);
                prompt.push(' ');
                prompt.push_str(INST_CLOSE);
            }
            Role::Assistant => {
                prompt.push(' ');
                prompt.push_str(&turn.content);
                prompt.push_str(EOS);
            }
        }
    }

    // System text with no human turn at all still reaches the model.
    if let Some(system) = pending_system {
        prompt.push_str(&format!("{} {} {}", INST_OPEN, system, INST_CLOSE));
    }

    prompt
}
