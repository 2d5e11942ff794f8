//! Résumé intake: free text in, structured `ResumeProfile` out. The profile is
//! the read-only context an interview's questions are generated from.

pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod store;
