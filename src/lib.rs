// Objeto Readability - LLM-backed readability grading for procurement-bid objects
// Library exports

pub mod analysis;
pub mod chat;
pub mod cli;
pub mod config;
pub mod errors;
pub mod llms;
pub mod logging;
pub mod models;
pub mod providers;
pub mod server;
