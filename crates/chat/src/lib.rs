pub mod completion;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod prompt;

pub use completion::{CompletionModel, GroqClient, SYSTEM_PROMPT};
pub use error::ChatError;
pub use guard::{Role, resolve_context_target, resolve_target};
pub use pipeline::{ChatPipeline, ChatRequest, ChatResponse, ResponseSource, SimilarItem};
pub use prompt::{build_hybrid_prompt, build_structured_prompt};
