pub mod badge;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod registry;
pub mod workspace;
