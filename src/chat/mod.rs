//! Chat Module
//!
//! Thin client for the first-aid assistant backend. The active profile (if not
//! guest) rides along with every question.

pub mod client;
pub mod types;

pub use client::{AskMode, ChatClient, ChatError};
pub use types::{AskRequest, AskResponse, Attachment, ProfilePayload};
