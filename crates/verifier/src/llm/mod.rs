//! Model-assisted semantic checks.
//!
//! The rest of the crate only ever sees [`LlmProvider`]: a prompt goes in,
//! free text comes out, failures are typed. Which provider sits behind the
//! trait (HTTP, stub) is the caller's choice at construction time.

mod http;
mod provider;
pub mod prompts;
pub mod response;
mod stub;

pub use http::HttpProvider;
pub use provider::{Completion, CompletionOptions, LlmError, LlmProvider};
pub use response::{parse_null_safety_response, SemanticAnswer};
pub use stub::{FailingProvider, StubProvider};
