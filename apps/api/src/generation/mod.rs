// Post generation core: intent, topic, variation, retrieval, prompt assembly.
// All model calls go through llm_client::CompletionModel.

pub mod generator;
pub mod handlers;
pub mod intent;
pub mod memory;
pub mod phrase_bank;
pub mod prompts;
pub mod retrieval;
pub mod topic;
pub mod variation;
