// Interview engine: cover-letter question, follow-up questions, final report.
// All LLM calls go through llm_client; history lives behind HistoryStore.

pub mod conversation;
pub mod handlers;
pub mod history;
pub mod prompts;
pub mod report;
