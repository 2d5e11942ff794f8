pub mod language;
pub mod resume;
pub mod session;
