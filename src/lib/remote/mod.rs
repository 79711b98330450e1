pub mod ssh;
pub mod types;
