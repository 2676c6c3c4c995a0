// Ephemeral chat history
//
// Lives for a single analysis request: created empty, extended after each
// completed exchange, dropped with the request. Nothing is shared between
// requests.

use super::types::Turn;

#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    turns: Vec<Turn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed human/assistant exchange
    pub fn push_exchange(&mut self, human: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::human(human));
        self.turns.push(Turn::assistant(assistant));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    #[test]
    fn test_new_history_is_empty() {
        let history = ChatHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_push_exchange_keeps_order() {
        let mut history = ChatHistory::new();
        history.push_exchange("classifique", "alta");
        history.push_exchange("justifique", "Texto claro.");

        let roles: Vec<Role> = history.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Human, Role::Assistant, Role::Human, Role::Assistant]
        );
        assert_eq!(history.turns()[1].content, "alta");
        assert_eq!(history.turns()[3].content, "Texto claro.");
    }
}
