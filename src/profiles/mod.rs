//! Profile management
//!
//! `ProfileManager` is the only way the rest of the app touches profiles:
//! selection, CRUD and guest fallback on top of the encrypted vault.

pub mod manager;

pub use manager::{ProfileError, ProfileManager};
