pub mod chat_stream;
pub mod config;
pub mod events;
pub mod frames;
pub mod leak_filter;
pub mod retry;
pub mod tools;
pub mod turn;
