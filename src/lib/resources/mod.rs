pub mod registry;
pub mod server;
pub mod service;
pub mod types;
