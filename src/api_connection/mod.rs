pub mod connection;
pub mod endpoints;

pub use connection::{ApiConnectionError, CompletionService};
pub use endpoints::{ChatCompletionRequest, ChatMessage, Provider, LOCAL_MODELS};
