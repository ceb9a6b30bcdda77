pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod server;
pub mod store;
pub mod transcriber;
pub mod upload;
