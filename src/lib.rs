//! QHelper - first-aid assistant library
//!
//! Medical profiles are kept in an encrypted vault on local storage and
//! attached to questions sent to the assistant backend.

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod profiles;
pub mod prompt;
pub mod store;
pub mod vault;
