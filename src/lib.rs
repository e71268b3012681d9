pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod services;
pub mod state;

// Convenient re-exports (so call sites can do `simplist::Registry`, etc.)
pub use commands::process_request;
pub use state::{
    registry::Registry,
    session::{ConnState, Session},
};
