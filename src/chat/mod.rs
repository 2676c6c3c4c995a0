// Conversation primitives shared by the prompt assembler and every backend

mod history;
mod types;

pub use history::ChatHistory;
pub use types::{Role, Turn};
