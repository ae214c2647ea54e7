//! Shared fixtures for Content Sync Manager test scenarios.

pub mod fixture;

pub use fixture::{seed_basic_store, TestSync};
