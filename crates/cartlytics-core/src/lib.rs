pub mod config;
pub mod naming;
pub mod stage;
