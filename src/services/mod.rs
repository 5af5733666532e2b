pub mod chat;
pub mod password;

pub use chat::ChatService;
