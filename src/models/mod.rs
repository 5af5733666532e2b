pub mod blog;
pub mod chat;
pub mod gallery;
pub mod user;
