pub mod cleanup;
pub mod stop_service;
pub mod types;
