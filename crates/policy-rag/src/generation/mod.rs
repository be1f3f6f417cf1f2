//! Answer generation: prompts, composition, source disclosure, formatting

pub mod composer;
pub mod format;
pub mod grounding;
pub mod prompt;

pub use composer::AnswerComposer;
pub use format::format_response;
pub use grounding::GroundingFilter;
pub use prompt::PromptBuilder;
