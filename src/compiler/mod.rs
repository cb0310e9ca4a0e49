pub mod adjacency;
pub mod core;
pub mod decoder;
pub mod expander;
pub mod loader;
pub mod materializer;
