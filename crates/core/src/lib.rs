//! wanderlore-core: the orchestration behind the tour-guide bot.
//!
//! A location event flows through [`pipeline::GuidePipeline`]: candidate
//! discovery via the suggest capability, per-user told-places and cooldown
//! state, model-assisted interest filtering, narration, and dispatch back
//! through the chat port. External services (suggest, language model,
//! speech, chat transport) sit behind traits so the whole pipeline runs
//! against test doubles.

pub mod aggregate;
pub mod dispatch;
pub mod filter;
pub mod finder;
pub mod llm;
pub mod narrate;
pub mod pipeline;
pub mod place;
pub mod session;
pub mod speech;
pub mod suggest;
