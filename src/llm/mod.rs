pub mod client;
pub mod explainer;
pub mod prompts;
pub mod types;

pub use client::*;
pub use explainer::*;
pub use types::*;
