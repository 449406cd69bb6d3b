// AI module for Gemini integration and prompt assembly
//
// This module provides:
// - The injectable generation client contract and its Gemini implementation
// - Secure credential storage via OS keychain
// - Prompt compilation from preferences and modifiers
// - Parameterised tool templates (arrangement, MIDI, effect rack)
// - The trainer system prompt

pub mod client;
pub mod credentials;
pub mod gemini_client;
pub mod prompt_compiler;
pub mod system_prompt;
pub mod tool_templates;

// Re-export commonly used types
pub use client::{
    AbortSignal, ChunkSink, CompletionRequest, GenerationClient, GenerationError, InlineBlob,
    StreamOutcome,
};
pub use credentials::CredentialManager;
pub use gemini_client::GeminiClient;
pub use prompt_compiler::{compile, Modifier};
pub use system_prompt::SYSTEM_PROMPT;
pub use tool_templates::{find_tool, ParamValue, ToolParams, ToolTemplate, BUILTIN_TOOLS};
