pub mod ai;
pub mod artifact;
pub mod config;
pub mod controller;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{build_generator, GenerateError, GenerationOptions, Generator};
pub use config::{Config, ConfigError, Settings};
pub use controller::{GenerationController, SubmitRejection, Submission};
pub use provider::Provider;
pub use session::Session;
pub use state::{ChatMessage, ChatRole, ConversationState, GenerationOutcome, ViewSnapshot};
