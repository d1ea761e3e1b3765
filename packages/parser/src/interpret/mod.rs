//! Interpretation of segmented guideline text into structured rules.

mod client;
mod config;
mod interpreter;
mod json;
mod prompt;

pub use client::{AnthropicClient, LlmClient, LlmRequest, LlmResponse, Message, Role};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockLlmClient;
pub use config::{InterpreterConfig, InterpreterConfigBuilder};
pub use interpreter::{Interpreter, LlmInterpreter};
pub use json::extract_json_from_response;
pub use prompt::{
    base_offense_system_prompt, build_base_offense_prompt, build_soc_prompt, soc_system_prompt,
};
