pub mod features;
pub mod marts;
