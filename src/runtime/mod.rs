pub mod config;
pub mod elements;
pub mod engine;
pub mod envelope;
pub mod layout;
pub mod pipeline;
pub mod session;
pub mod source;
