//! Built-in recipes.

mod conversational_qa;
mod document_qa;
mod short_answer_qa;

pub use conversational_qa::ConversationalQa;
pub use document_qa::DocumentQa;
pub use short_answer_qa::ShortAnswerQa;

use crate::registry::RecipeEntry;

pub static BUILTIN: &[RecipeEntry] = &[
    RecipeEntry {
        name: short_answer_qa::NAME,
        description: "Answer one question through the short-answer agent",
        build: ShortAnswerQa::boxed,
    },
    RecipeEntry {
        name: conversational_qa::NAME,
        description: "Ask a sequence of follow-up questions in one conversation",
        build: ConversationalQa::boxed,
    },
    RecipeEntry {
        name: document_qa::NAME,
        description: "Answer every line ending in '?' of each input document",
        build: DocumentQa::boxed,
    },
];
