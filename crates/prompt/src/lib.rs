//! Prompt system for PeerConnect.
//!
//! This crate provides the prompts sent to the generation model:
//! - Built-in tone classification templates
//! - Workspace overrides from `.peerconnect/prompts/*.yml`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompts, load_prompt, TONE_ARTICLE_PROMPT_ID, TONE_ENTRY_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOrigin};
