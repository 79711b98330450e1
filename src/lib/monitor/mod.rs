pub mod guard;
pub mod monitor;
pub mod poller;
pub mod types;
