#[cfg(feature = "openai")]
pub mod openai;

pub mod demo;
