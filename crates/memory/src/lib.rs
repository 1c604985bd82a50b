//! Persistent memory for WOPR: the knowledge document and the
//! REMEMBER/FORGET directives that edit it.

pub mod directives;
pub mod file_backend;
pub mod in_memory;
pub mod knowledge;

pub use directives::{
    DirectiveKind, DirectiveOutcome, MemoryDirective, MemoryInterpreter, extract_user_name,
    parse_directives,
};
pub use file_backend::FileStorage;
pub use in_memory::InMemoryStorage;
pub use knowledge::KnowledgeBase;
