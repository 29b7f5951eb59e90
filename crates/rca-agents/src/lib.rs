//! Agents answer natural-language questions through the answering service.
//!
//! Recipes only see the [`Agent`] trait; the registry hands out fresh
//! instances by name.

mod agent;
mod conversational;
mod registry;
mod short_answer;

pub use agent::{Agent, TRANSCRIPT_TARGET};
pub use conversational::ConversationalAgent;
pub use registry::{AgentRegistry, CONVERSATIONAL, SHORT_ANSWER};
pub use short_answer::ShortAnswerAgent;
