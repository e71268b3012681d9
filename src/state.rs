pub mod registry;
pub mod session;
pub mod session_registry;
