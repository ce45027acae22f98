//! CLI subcommand implementations.

pub mod agent;
pub mod chatbot;
pub mod doctor;
pub mod init_db;
pub mod schema;
