//! Interview session lifecycle: persistence, per-session serialization and the
//! HTTP handlers that drive a session from start to completion.

pub mod handlers;
pub mod manager;
pub mod store;

pub use manager::SessionManager;
pub use store::PgSessionStore;
