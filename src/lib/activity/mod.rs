pub mod recorder;
pub mod store;
pub mod types;
