pub mod openai;

pub use openai::{ChatTurn, CompletionClient, CompletionError, OpenAiClient};
