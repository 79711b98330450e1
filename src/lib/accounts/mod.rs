pub mod directory;
pub mod types;
