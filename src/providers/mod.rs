//! Shared provider implementations reused by concrete backends.

pub mod openai_compatible;
