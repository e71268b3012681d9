pub mod broadcast;
pub mod connection;
pub mod http;
pub mod output;
pub mod protocol;
pub mod sink;
pub mod tcp;
